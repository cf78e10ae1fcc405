use anyhow::{Context, Result};
use mongodb::Database;
use mongodb::options::DatabaseOptions;
use std::time::Duration;
use tracing::{debug, info};

use super::MongoContainer;
use super::client::connect_client;
use crate::config;
use crate::lifecycle::TestResource;

impl MongoContainer {
    /// Handle to the database `name`, created by MongoDB on first write.
    pub async fn new_database(
        &self,
        name: &str,
        options: Option<DatabaseOptions>,
    ) -> Result<Database> {
        self.new_database_with_timeout(config::default_timeout()?, name, options)
            .await
    }

    pub async fn new_database_with_timeout(
        &self,
        timeout: Duration,
        name: &str,
        options: Option<DatabaseOptions>,
    ) -> Result<Database> {
        let client = self.new_client_with_timeout(timeout).await?;
        let database = match options {
            Some(options) => client.database_with_options(name, options),
            None => client.database(name),
        };
        Ok(database)
    }

    /// A database with a random name, dropped when the guard goes out of scope.
    pub async fn new_test_database(
        &self,
        options: Option<DatabaseOptions>,
    ) -> Result<TestResource<Database>> {
        self.new_test_database_with_timeout(config::default_timeout()?, options)
            .await
    }

    pub async fn new_test_database_with_timeout(
        &self,
        timeout: Duration,
        options: Option<DatabaseOptions>,
    ) -> Result<TestResource<Database>> {
        let name = random_database_name();
        let database = self
            .new_database_with_timeout(timeout, &name, options)
            .await?;
        info!("Created MongoDB test database {}", name);

        let uri = self.connection_string.clone();
        let label = format!("MongoDB database {}", name);
        Ok(TestResource::new(database, label, move || {
            drop_database(uri, name)
        }))
    }
}

fn random_database_name() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

async fn drop_database(uri: String, name: String) -> Result<()> {
    debug!("Dropping MongoDB database {}", name);
    let client = connect_client(&uri).await?;
    client
        .database(&name)
        .drop()
        .await
        .with_context(|| format!("Failed to drop MongoDB database {}", name))?;
    client.shutdown().await;
    Ok(())
}
