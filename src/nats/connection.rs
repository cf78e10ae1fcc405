use anyhow::{Context, Result};
use async_nats::{Client, ConnectOptions};
use std::time::Duration;
use tracing::debug;

use super::NatsContainer;
use crate::config;
use crate::connection::connect_with_timeout;
use crate::lifecycle::TestResource;

impl NatsContainer {
    /// Connect to the server with the configured timeout.
    pub async fn new_connection(&self, options: ConnectOptions) -> Result<Client> {
        self.new_connection_with_timeout(config::default_timeout()?, options)
            .await
    }

    /// Connect to the server, giving up after `timeout`.
    ///
    /// A failed connect is returned as is; a connect still pending at the
    /// deadline is abandoned with a timeout error.
    pub async fn new_connection_with_timeout(
        &self,
        timeout: Duration,
        options: ConnectOptions,
    ) -> Result<Client> {
        debug!("Connecting to {}", self.connection_string);
        let url = self.connection_string.as_str();
        connect_with_timeout(timeout, "NATS", async move {
            options
                .connect(url)
                .await
                .with_context(|| format!("Failed to connect to {}", url))
        })
        .await
    }

    /// Like [`NatsContainer::new_connection`]; the connection closes with the guard.
    pub async fn new_test_connection(&self, options: ConnectOptions) -> Result<TestResource<Client>> {
        self.new_test_connection_with_timeout(config::default_timeout()?, options)
            .await
    }

    pub async fn new_test_connection_with_timeout(
        &self,
        timeout: Duration,
        options: ConnectOptions,
    ) -> Result<TestResource<Client>> {
        let client = self.new_connection_with_timeout(timeout, options).await?;
        Ok(TestResource::without_teardown(client, "NATS connection"))
    }
}
