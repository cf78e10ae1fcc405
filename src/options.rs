//! Container requests and the options that customize them
//!
//! Every backend builds a default [`ContainerRequest`] and then applies the
//! caller's [`ContainerOption`]s in order. Options are the extension point for
//! backend-specific settings such as credentials or command-line flags.

use anyhow::{Result, anyhow};
use std::collections::HashMap;

const IMAGE_TAG_DELIMITER: char = ':';

/// Readiness strategy for a starting container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitFor {
    /// Ready once the container output has contained `message` `occurrence` times
    Log { message: String, occurrence: usize },
}

impl WaitFor {
    pub fn log(message: impl Into<String>) -> Self {
        WaitFor::Log {
            message: message.into(),
            occurrence: 1,
        }
    }

    /// Require the message to appear `occurrence` times.
    pub fn with_occurrence(self, occurrence: usize) -> Self {
        match self {
            WaitFor::Log { message, .. } => WaitFor::Log {
                message,
                occurrence,
            },
        }
    }
}

/// Everything needed to create and start a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerRequest {
    pub image: String,
    pub exposed_ports: Vec<String>,
    pub env: HashMap<String, String>,
    pub cmd: Vec<String>,
    pub wait_for: Option<WaitFor>,
    pub name: Option<String>,
}

impl ContainerRequest {
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }
}

/// Customizes a [`ContainerRequest`] before the container is created.
pub type ContainerOption = Box<dyn FnOnce(&mut ContainerRequest) -> Result<()> + Send>;

/// Apply options in order, stopping at the first error.
///
/// The error is returned as produced by the option so callers can downcast it.
pub fn apply_options(
    request: &mut ContainerRequest,
    options: impl IntoIterator<Item = ContainerOption>,
) -> Result<()> {
    for option in options {
        option(request)?;
    }
    Ok(())
}

/// Set the tag of the image, replacing any tag already present.
///
/// An empty tag leaves the bare repository name (the runtime then pulls `latest`).
/// Any `:` inside the tag is dropped.
pub fn with_custom_tag(tag: impl Into<String>) -> ContainerOption {
    let tag = tag.into();
    Box::new(move |request| {
        let repository = request
            .image
            .split(IMAGE_TAG_DELIMITER)
            .next()
            .unwrap_or_default();
        if repository.is_empty() {
            return Err(anyhow!("image not set"));
        }

        let tag = tag.replace(IMAGE_TAG_DELIMITER, "");
        request.image = if tag.is_empty() {
            repository.to_string()
        } else {
            format!("{}{}{}", repository, IMAGE_TAG_DELIMITER, tag)
        };
        Ok(())
    })
}

/// Set an environment variable on the container.
pub fn with_env(key: impl Into<String>, value: impl Into<String>) -> ContainerOption {
    let (key, value) = (key.into(), value.into());
    Box::new(move |request| {
        request.env.insert(key, value);
        Ok(())
    })
}

/// Append an argument to the container command.
pub fn with_cmd_arg(arg: impl Into<String>) -> ContainerOption {
    let arg = arg.into();
    Box::new(move |request| {
        request.cmd.push(arg);
        Ok(())
    })
}

/// Give the container a fixed name instead of a generated one.
pub fn with_name(name: impl Into<String>) -> ContainerOption {
    let name = name.into();
    Box::new(move |request| {
        request.name = Some(name);
        Ok(())
    })
}
