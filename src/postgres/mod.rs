//! PostgreSQL containers
//!
//! Starts the `postgres` image with `fsync` disabled and returns a
//! [`SqlContainer`]. Defaults to `postgres:latest` unless an option or the
//! configuration sets a tag.
//!
//! Containers from [`run`] and [`must_run`] live until
//! [`crate::docker::Container::terminate`] is called or the last handle is
//! dropped; [`run_for_test`] ties the container to a guard instead.

mod options;

pub use options::{
    ENV_POSTGRES_DB, ENV_POSTGRES_HOST_AUTH_METHOD, ENV_POSTGRES_PASSWORD, ENV_POSTGRES_USER,
    configured_options, with_initial_database, with_password, with_trust, with_user,
};

use anyhow::{Context, Result, anyhow};
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::config::{self, Config};
use crate::connection::mask_url_password;
use crate::docker;
use crate::lifecycle::TestResource;
use crate::options::{ContainerOption, ContainerRequest, WaitFor, apply_options};
use crate::sql::SqlContainer;

pub const IMAGE: &str = "postgres";
pub const MAPPED_PORT: &str = "5432/tcp";
pub const READY_LOG: &str = "database system is ready to accept connections";
pub const PROTO: &str = "postgres";
pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_PASSWORD: &str = "postgres";

/// Create and start a PostgreSQL container with the configured timeout.
pub async fn run(options: Vec<ContainerOption>) -> Result<SqlContainer> {
    run_with_timeout(config::default_timeout()?, options).await
}

pub async fn run_with_timeout(
    timeout: Duration,
    options: Vec<ContainerOption>,
) -> Result<SqlContainer> {
    let request = make_container_request(config::global()?, options)?;
    let container = docker::start_container(&request, timeout).await?;

    let host_port = container.mapped_port(MAPPED_PORT)?;
    let connection_string = make_connection_string(&request, container.host(), host_port)?;
    info!("PostgreSQL ready at {}", mask_url_password(&connection_string));

    Ok(SqlContainer::new(container, connection_string))
}

/// Same as [`run`] but panics if the container cannot be started.
pub async fn must_run(options: Vec<ContainerOption>) -> SqlContainer {
    match run(options).await {
        Ok(container) => container,
        Err(e) => panic!("error creating container: {:#}", e),
    }
}

/// Start a container that is terminated when the returned guard is dropped.
///
/// Panics if the container cannot be started, failing the calling test.
pub async fn run_for_test(options: Vec<ContainerOption>) -> TestResource<SqlContainer> {
    let timeout = match config::default_timeout() {
        Ok(timeout) => timeout,
        Err(e) => panic!("error starting container: {:#}", e),
    };
    run_for_test_with_timeout(timeout, options).await
}

pub async fn run_for_test_with_timeout(
    timeout: Duration,
    options: Vec<ContainerOption>,
) -> TestResource<SqlContainer> {
    let postgres = match run_with_timeout(timeout, options).await {
        Ok(container) => container,
        Err(e) => panic!("error starting container: {:#}", e),
    };
    let container = postgres.container().clone();
    docker::terminate_on_drop(postgres, &container)
}

pub(crate) fn make_container_request(
    config: &Config,
    options: Vec<ContainerOption>,
) -> Result<ContainerRequest> {
    let mut request = ContainerRequest {
        image: IMAGE.to_string(),
        exposed_ports: vec![MAPPED_PORT.to_string()],
        // Logged once by the init server and again when the real server starts
        wait_for: Some(WaitFor::log(READY_LOG).with_occurrence(2)),
        cmd: ["postgres", "-c", "fsync=off"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ..Default::default()
    };

    apply_options(&mut request, configured_options(&config.postgres))?;
    apply_options(&mut request, options)?;

    if request.env_var(ENV_POSTGRES_PASSWORD).is_none_or(str::is_empty) {
        with_password(DEFAULT_PASSWORD)(&mut request)?;
    }

    Ok(request)
}

/// Credentials and database name are percent-encoded
fn make_connection_string(request: &ContainerRequest, host: &str, port: u16) -> Result<String> {
    let user = request.env_var(ENV_POSTGRES_USER).unwrap_or(DEFAULT_USER);
    let password = request
        .env_var(ENV_POSTGRES_PASSWORD)
        .unwrap_or(DEFAULT_PASSWORD);

    let mut url = Url::parse(&format!("{}://{}:{}", PROTO, host, port))
        .with_context(|| format!("Invalid PostgreSQL address {}:{}", host, port))?;
    url.set_username(user)
        .and_then(|_| url.set_password(Some(password)))
        .map_err(|_| anyhow!("Cannot add credentials to PostgreSQL address {}", host))?;
    if let Some(database) = request.env_var(ENV_POSTGRES_DB) {
        url.set_path(&format!("/{}", database));
    }
    url.set_query(Some("sslmode=disable"));

    Ok(url.to_string())
}
