use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::client::connect_pool;
use super::{SqlContainer, quote_identifier};
use crate::config;
use crate::constants::TEARDOWN_TIMEOUT;
use crate::idgen::generate_id;
use crate::lifecycle::TestResource;

impl SqlContainer {
    /// Create the database `name` and return a pool connected to it.
    ///
    /// Migrations in `migrations` (a directory, optionally written as a
    /// `file://` URL) are applied before the pool is returned.
    pub async fn new_database(&self, name: &str, migrations: Option<&Path>) -> Result<PgPool> {
        self.new_database_with_timeout(config::default_timeout()?, name, migrations)
            .await
    }

    pub async fn new_database_with_timeout(
        &self,
        timeout: Duration,
        name: &str,
        migrations: Option<&Path>,
    ) -> Result<PgPool> {
        let admin = self.new_client_with_timeout(timeout).await?;
        sqlx::query(&format!("CREATE DATABASE {}", quote_identifier(name)))
            .execute(&admin)
            .await
            .with_context(|| format!("Failed to create database {}", name))?;
        admin.close().await;

        let options = self.connect_options()?.database(name);
        let pool = connect_pool(options, timeout).await?;

        if let Some(dir) = migrations {
            run_migrations(&pool, dir).await?;
        }

        Ok(pool)
    }

    /// A database with a random name, dropped when the guard goes out of scope.
    pub async fn new_test_database(
        &self,
        migrations: Option<&Path>,
    ) -> Result<TestResource<PgPool>> {
        self.new_test_database_with_timeout(config::default_timeout()?, migrations)
            .await
    }

    pub async fn new_test_database_with_timeout(
        &self,
        timeout: Duration,
        migrations: Option<&Path>,
    ) -> Result<TestResource<PgPool>> {
        let name = generate_id();
        let pool = self
            .new_database_with_timeout(timeout, &name, migrations)
            .await?;
        info!("Created PostgreSQL test database {}", name);

        let admin = self.connect_options()?;
        let label = format!("PostgreSQL database {}", name);
        Ok(TestResource::new(pool, label, move || {
            drop_database(admin, name)
        }))
    }
}

async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<()> {
    let dir = migrations_dir(dir);
    debug!("Running migrations from {}", dir.display());

    let migrator = Migrator::new(dir.as_path())
        .await
        .with_context(|| format!("Failed to read migrations from {}", dir.display()))?;
    migrator
        .run(pool)
        .await
        .with_context(|| format!("Failed to apply migrations from {}", dir.display()))
}

/// Accept both plain paths and `file://` URLs
fn migrations_dir(dir: &Path) -> PathBuf {
    match dir.to_str().and_then(|s| s.strip_prefix("file://")) {
        Some(stripped) => PathBuf::from(stripped),
        None => dir.to_path_buf(),
    }
}

async fn drop_database(admin: sqlx::postgres::PgConnectOptions, name: String) -> Result<()> {
    debug!("Dropping PostgreSQL database {}", name);
    let pool = connect_pool(admin, TEARDOWN_TIMEOUT).await?;
    sqlx::query(&format!(
        "DROP DATABASE IF EXISTS {} WITH (FORCE)",
        quote_identifier(&name)
    ))
    .execute(&pool)
    .await
    .with_context(|| format!("Failed to drop database {}", name))?;
    pool.close().await;
    Ok(())
}
