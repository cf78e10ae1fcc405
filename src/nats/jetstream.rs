use anyhow::Result;
use async_nats::ConnectOptions;
use async_nats::jetstream::{self, Context};
use std::time::Duration;

use super::NatsContainer;
use crate::config;
use crate::lifecycle::TestResource;

// Use new_connection and jetstream::new directly to customize the connection.
impl NatsContainer {
    /// JetStream context over a new default connection.
    ///
    /// The container must have been started with [`super::with_jet_stream`].
    pub async fn new_jet_stream(&self) -> Result<Context> {
        self.new_jet_stream_with_timeout(config::default_timeout()?)
            .await
    }

    pub async fn new_jet_stream_with_timeout(&self, timeout: Duration) -> Result<Context> {
        let client = self
            .new_connection_with_timeout(timeout, ConnectOptions::new())
            .await?;
        Ok(jetstream::new(client))
    }

    pub async fn new_test_jet_stream(&self) -> Result<TestResource<Context>> {
        self.new_test_jet_stream_with_timeout(config::default_timeout()?)
            .await
    }

    pub async fn new_test_jet_stream_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<TestResource<Context>> {
        let context = self.new_jet_stream_with_timeout(timeout).await?;
        Ok(TestResource::without_teardown(context, "NATS JetStream context"))
    }
}
