use super::JET_STREAM_FLAG;
use crate::config;
use crate::options::{ContainerOption, with_cmd_arg, with_custom_tag};

/// Start the server with JetStream enabled.
pub fn with_jet_stream() -> ContainerOption {
    with_cmd_arg(JET_STREAM_FLAG)
}

/// Options derived from the `nats` configuration section
pub fn configured_options(settings: &config::Nats) -> Vec<ContainerOption> {
    let mut options = Vec::new();
    if let Some(tag) = &settings.tag {
        options.push(with_custom_tag(tag.clone()));
    }
    if settings.jetstream {
        options.push(with_jet_stream());
    }
    options
}
