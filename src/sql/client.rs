use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::SqlContainer;
use crate::config;
use crate::connection::{connect_with_timeout, mask_url_password};
use crate::lifecycle::TestResource;

impl SqlContainer {
    /// Open a pool on the container. The connection is tested once before returning.
    pub async fn new_client(&self) -> Result<PgPool> {
        self.new_client_with_timeout(config::default_timeout()?)
            .await
    }

    pub async fn new_client_with_timeout(&self, timeout: Duration) -> Result<PgPool> {
        let options = self.connect_options()?;
        connect_with_timeout(timeout, "PostgreSQL", connect_pool(options, timeout)).await
    }

    /// Like [`SqlContainer::new_client`]; the pool is dropped with the guard.
    pub async fn new_test_client(&self) -> Result<TestResource<PgPool>> {
        self.new_test_client_with_timeout(config::default_timeout()?)
            .await
    }

    pub async fn new_test_client_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<TestResource<PgPool>> {
        let pool = self.new_client_with_timeout(timeout).await?;
        Ok(TestResource::without_teardown(pool, "PostgreSQL client"))
    }

    pub(super) fn connect_options(&self) -> Result<PgConnectOptions> {
        PgConnectOptions::from_str(&self.connection_string).with_context(|| {
            format!(
                "Invalid database URL {}",
                mask_url_password(&self.connection_string)
            )
        })
    }
}

pub(super) async fn connect_pool(options: PgConnectOptions, timeout: Duration) -> Result<PgPool> {
    debug!(
        "Connecting to PostgreSQL database {}",
        options.get_database().unwrap_or("(default)")
    );

    let pool = PgPoolOptions::new()
        .acquire_timeout(timeout)
        .connect_with(options)
        .await
        .context("Failed to connect to PostgreSQL")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("Failed to ping PostgreSQL")?;

    Ok(pool)
}
