use anyhow::{Context, Result};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::time::Duration;
use tracing::debug;

use super::MongoContainer;
use crate::config;
use crate::connection::{connect_with_timeout, mask_url_password};
use crate::lifecycle::TestResource;

impl MongoContainer {
    /// Connect a client to the container and verify it with a `ping`.
    pub async fn new_client(&self) -> Result<Client> {
        self.new_client_with_timeout(config::default_timeout()?)
            .await
    }

    pub async fn new_client_with_timeout(&self, timeout: Duration) -> Result<Client> {
        connect_with_timeout(timeout, "MongoDB", connect_client(&self.connection_string)).await
    }

    /// Like [`MongoContainer::new_client`]; the client is released with the guard.
    pub async fn new_test_client(&self) -> Result<TestResource<Client>> {
        self.new_test_client_with_timeout(config::default_timeout()?)
            .await
    }

    pub async fn new_test_client_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<TestResource<Client>> {
        let client = self.new_client_with_timeout(timeout).await?;
        Ok(TestResource::without_teardown(client, "MongoDB client"))
    }
}

pub(super) async fn connect_client(uri: &str) -> Result<Client> {
    debug!("Connecting to {}", mask_url_password(uri));

    let options = ClientOptions::parse(uri)
        .await
        .with_context(|| format!("Invalid MongoDB URI {}", mask_url_password(uri)))?;
    let client = Client::with_options(options).context("Failed to create MongoDB client")?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .context("Failed to ping MongoDB")?;

    Ok(client)
}
