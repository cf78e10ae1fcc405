//! MongoDB containers, clients and throwaway databases

use anyhow::Result;
use mongodb::bson::{Document, doc};
use testdeps::mongo::{self, with_root_user};
use testdeps::options::with_custom_tag;

use crate::helpers::docker::docker_available;

#[tokio::test]
async fn test_mongo_test_database_is_dropped() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let mongo = mongo::run_test(vec![with_custom_tag("7")]).await?;
    assert!(mongo.connection_string.starts_with("mongodb://"));
    assert_eq!(mongo.image(), "mongo:7");

    let db = mongo.new_test_database(None).await?;
    let name = db.name().to_string();
    assert_eq!(name.len(), 32);

    let users = db.collection::<Document>("users");
    users
        .insert_one(doc! { "name": "example", "email": "example@example.com" })
        .await?;
    let found = users
        .find_one(doc! { "email": "example@example.com" })
        .await?
        .expect("inserted user");
    assert_eq!(found.get_str("name")?, "example");

    db.close().await?;

    let client = mongo.new_test_client().await?;
    let names = client.list_database_names().await?;
    assert!(!names.contains(&name), "{} should have been dropped", name);
    Ok(())
}

#[tokio::test]
async fn test_mongo_with_root_user() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let mongo = mongo::run_test(vec![with_root_user("root", "secret")]).await?;
    assert!(mongo.connection_string.contains("root:secret@"));

    let db = mongo.new_database("accounts", None).await?;
    db.collection::<Document>("events")
        .insert_one(doc! { "kind": "created" })
        .await?;
    assert_eq!(
        db.collection::<Document>("events")
            .count_documents(doc! {})
            .await?,
        1
    );
    Ok(())
}
