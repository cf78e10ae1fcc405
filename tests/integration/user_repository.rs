//! A small repository tested against a throwaway PostgreSQL database,
//! the way an application would use this crate: one container for the whole
//! test binary, one database per test.

use anyhow::Result;
use sqlx::PgPool;
use testdeps::postgres;
use testdeps::sql::SqlContainer;
use tokio::sync::OnceCell;

use crate::fixtures::users_migrations;
use crate::helpers::docker::docker_available;

static POSTGRES: OnceCell<SqlContainer> = OnceCell::const_new();

async fn shared_postgres() -> &'static SqlContainer {
    POSTGRES
        .get_or_init(|| async { postgres::must_run(vec![]).await })
        .await
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
struct User {
    name: String,
    email: String,
}

async fn create_user(db: &PgPool, user: &User) -> Result<()> {
    sqlx::query("INSERT INTO users (name, email) VALUES ($1, $2)")
        .bind(&user.name)
        .bind(&user.email)
        .execute(db)
        .await?;
    Ok(())
}

async fn find_users_by_email(db: &PgPool, email: &str) -> Result<Vec<User>> {
    Ok(
        sqlx::query_as::<_, User>("SELECT name, email FROM users WHERE email = $1")
            .bind(email)
            .fetch_all(db)
            .await?,
    )
}

#[tokio::test]
async fn test_create_user() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let db = shared_postgres()
        .await
        .new_test_database(Some(users_migrations().as_path()))
        .await?;

    let user = User {
        name: "example".to_string(),
        email: "example@example.com".to_string(),
    };
    create_user(&db, &user).await?;

    assert_eq!(find_users_by_email(&db, &user.email).await?, vec![user]);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let db = shared_postgres()
        .await
        .new_test_database(Some(users_migrations().as_path()))
        .await?;

    let user = User {
        name: "first".to_string(),
        email: "same@example.com".to_string(),
    };
    create_user(&db, &user).await?;

    let duplicate = User {
        name: "second".to_string(),
        ..user.clone()
    };
    assert!(create_user(&db, &duplicate).await.is_err());
    assert_eq!(find_users_by_email(&db, &user.email).await?, vec![user]);
    Ok(())
}

#[tokio::test]
async fn test_container_per_test() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let postgres = postgres::run_for_test(vec![postgres::with_password("p@ss/w#rd")]).await;
    let db = postgres
        .new_test_database(Some(users_migrations().as_path()))
        .await?;

    assert!(find_users_by_email(&db, "nobody@example.com").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_databases_are_isolated() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let postgres = shared_postgres().await;
    let first = postgres
        .new_test_database(Some(users_migrations().as_path()))
        .await?;
    let second = postgres
        .new_test_database(Some(users_migrations().as_path()))
        .await?;

    let user = User {
        name: "only-in-first".to_string(),
        email: "isolated@example.com".to_string(),
    };
    create_user(&first, &user).await?;

    assert!(find_users_by_email(&second, &user.email).await?.is_empty());
    Ok(())
}
