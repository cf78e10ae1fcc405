//! PostgreSQL containers, pools and throwaway databases

use anyhow::Result;
use testdeps::postgres::{self, with_initial_database, with_password, with_user};

use crate::fixtures::users_migrations;
use crate::helpers::docker::docker_available;

#[tokio::test]
async fn test_postgres_custom_credentials() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let postgres = postgres::run_for_test(vec![
        with_user("app"),
        with_password("secret"),
        with_initial_database("orders"),
    ])
    .await;
    assert!(
        postgres
            .connection_string
            .starts_with("postgres://app:secret@")
    );
    assert!(postgres.connection_string.ends_with("/orders?sslmode=disable"));

    let pool = postgres.new_test_client().await?;
    let (user, database): (String, String) =
        sqlx::query_as("SELECT current_user::text, current_database()::text")
            .fetch_one(&*pool)
            .await?;
    assert_eq!(user, "app");
    assert_eq!(database, "orders");
    Ok(())
}

#[tokio::test]
async fn test_postgres_test_database_lifecycle() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let postgres = postgres::run_for_test(vec![]).await;

    let db = postgres
        .new_test_database(Some(users_migrations().as_path()))
        .await?;
    let (name,): (String,) = sqlx::query_as("SELECT current_database()::text")
        .fetch_one(&*db)
        .await?;
    assert_eq!(name.len(), 10);

    let (tables,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM information_schema.tables WHERE table_name = 'users'",
    )
    .fetch_one(&*db)
    .await?;
    assert_eq!(tables, 1);

    db.close().await?;

    let admin = postgres.new_test_client().await?;
    let (remaining,): (i64,) =
        sqlx::query_as("SELECT count(*) FROM pg_database WHERE datname = $1")
            .bind(&name)
            .fetch_one(&*admin)
            .await?;
    assert_eq!(remaining, 0);
    Ok(())
}

#[tokio::test]
async fn test_postgres_file_url_migrations() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let postgres = postgres::run_for_test(vec![]).await;
    let migrations = format!("file://{}", users_migrations().display());

    let pool = postgres
        .new_database("MixedCaseName", Some(std::path::Path::new(&migrations)))
        .await?;
    sqlx::query("INSERT INTO users (name, email) VALUES ('a', 'a@example.com')")
        .execute(&pool)
        .await?;
    pool.close().await;
    Ok(())
}
