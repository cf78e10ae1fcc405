//! MongoDB containers
//!
//! Starts the `mongo` image and hands out clients and throwaway databases
//! connected to it. Defaults to `mongo:latest` unless an option or the
//! configuration sets a tag.

mod client;
mod database;
mod options;

pub use options::{
    ENV_MONGO_INITDB_ROOT_PASSWORD, ENV_MONGO_INITDB_ROOT_USERNAME, configured_options,
    with_root_user,
};

use anyhow::{Context, Result, anyhow};
use std::ops::Deref;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::config::{self, Config};
use crate::connection::mask_url_password;
use crate::docker::{self, Container};
use crate::lifecycle::TestResource;
use crate::options::{ContainerOption, ContainerRequest, WaitFor, apply_options};

pub const IMAGE: &str = "mongo";
pub const MAPPED_PORT: &str = "27017/tcp";
pub const READY_LOG: &str = "Waiting for connections";
pub const PROTO: &str = "mongodb";

/// A running MongoDB container
#[derive(Debug, Clone)]
pub struct MongoContainer {
    container: Container,
    pub connection_string: String,
}

impl Deref for MongoContainer {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl MongoContainer {
    pub fn container(&self) -> &Container {
        &self.container
    }
}

/// Create and start a MongoDB container.
///
/// Uses the configured timeout (two minutes by default). See [`run_with_timeout`].
pub async fn run(options: Vec<ContainerOption>) -> Result<MongoContainer> {
    run_with_timeout(config::default_timeout()?, options).await
}

/// Create and start a MongoDB container, giving up after `timeout`.
pub async fn run_with_timeout(
    timeout: Duration,
    options: Vec<ContainerOption>,
) -> Result<MongoContainer> {
    let request = make_container_request(config::global()?, options)?;
    let container = docker::start_container(&request, timeout).await?;

    let host_port = container.mapped_port(MAPPED_PORT)?;
    let connection_string = make_connection_string(&request, container.host(), host_port)?;
    info!("MongoDB ready at {}", mask_url_password(&connection_string));

    Ok(MongoContainer {
        container,
        connection_string,
    })
}

/// Like [`run`], but the container is terminated when the returned guard is dropped.
pub async fn run_test(options: Vec<ContainerOption>) -> Result<TestResource<MongoContainer>> {
    run_test_with_timeout(config::default_timeout()?, options).await
}

pub async fn run_test_with_timeout(
    timeout: Duration,
    options: Vec<ContainerOption>,
) -> Result<TestResource<MongoContainer>> {
    let mongo = run_with_timeout(timeout, options).await?;
    let container = mongo.container.clone();
    Ok(docker::terminate_on_drop(mongo, &container))
}

pub(crate) fn make_container_request(
    config: &Config,
    options: Vec<ContainerOption>,
) -> Result<ContainerRequest> {
    let mut request = ContainerRequest {
        image: IMAGE.to_string(),
        exposed_ports: vec![MAPPED_PORT.to_string()],
        wait_for: Some(WaitFor::log(READY_LOG)),
        ..Default::default()
    };

    apply_options(&mut request, configured_options(&config.mongo))?;
    apply_options(&mut request, options)?;

    Ok(request)
}

/// Carries the root credentials, percent-encoded, when both are set
fn make_connection_string(request: &ContainerRequest, host: &str, port: u16) -> Result<String> {
    let mut url = Url::parse(&format!("{}://{}:{}", PROTO, host, port))
        .with_context(|| format!("Invalid MongoDB address {}:{}", host, port))?;

    if let (Some(username), Some(password)) = (
        request.env_var(ENV_MONGO_INITDB_ROOT_USERNAME),
        request.env_var(ENV_MONGO_INITDB_ROOT_PASSWORD),
    ) {
        url.set_username(username)
            .and_then(|_| url.set_password(Some(password)))
            .map_err(|_| anyhow!("Cannot add credentials to MongoDB address {}", host))?;
    }

    Ok(url.to_string())
}
