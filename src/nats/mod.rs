//! NATS containers
//!
//! Starts the `nats` image and hands out connections and JetStream contexts.
//! JetStream is only available on containers started with [`with_jet_stream`].

mod connection;
mod jetstream;
mod options;

pub use options::{configured_options, with_jet_stream};

use anyhow::Result;
use std::ops::Deref;
use std::time::Duration;
use tracing::info;

use crate::config::{self, Config};
use crate::docker::{self, Container};
use crate::lifecycle::TestResource;
use crate::options::{ContainerOption, ContainerRequest, WaitFor, apply_options};

pub const IMAGE: &str = "nats";
pub const MAPPED_PORT: &str = "4222/tcp";
pub const READY_LOG: &str = "Server is ready";
pub const PROTO: &str = "nats";
pub const JET_STREAM_FLAG: &str = "-js";

/// A running NATS server
#[derive(Debug, Clone)]
pub struct NatsContainer {
    container: Container,
    pub connection_string: String,
}

impl Deref for NatsContainer {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl NatsContainer {
    pub fn container(&self) -> &Container {
        &self.container
    }
}

/// Create and start a NATS container with the configured timeout.
pub async fn run(options: Vec<ContainerOption>) -> Result<NatsContainer> {
    run_with_timeout(config::default_timeout()?, options).await
}

pub async fn run_with_timeout(
    timeout: Duration,
    options: Vec<ContainerOption>,
) -> Result<NatsContainer> {
    let request = make_container_request(config::global()?, options)?;
    let container = docker::start_container(&request, timeout).await?;

    let connection_string = container.port_endpoint(MAPPED_PORT, PROTO)?;
    info!("NATS ready at {}", connection_string);

    Ok(NatsContainer {
        container,
        connection_string,
    })
}

/// Like [`run`], but the container is terminated when the returned guard is dropped.
pub async fn run_test(options: Vec<ContainerOption>) -> Result<TestResource<NatsContainer>> {
    run_test_with_timeout(config::default_timeout()?, options).await
}

pub async fn run_test_with_timeout(
    timeout: Duration,
    options: Vec<ContainerOption>,
) -> Result<TestResource<NatsContainer>> {
    let nats = run_with_timeout(timeout, options).await?;
    let container = nats.container.clone();
    Ok(docker::terminate_on_drop(nats, &container))
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

    apply_options(&mut request, configured_options(&config.nats))?;
    apply_options(&mut request, options)?;

    Ok(request)
}
