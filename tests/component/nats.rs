//! NATS containers, connections and JetStream contexts

use anyhow::Result;
use async_nats::ConnectOptions;
use async_nats::jetstream::stream;
use futures_util::StreamExt;
use std::time::Duration;
use testdeps::nats::{self, with_jet_stream};

use crate::helpers::docker::docker_available;

#[tokio::test]
async fn test_nats_publish_subscribe() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let nats = nats::run_test(vec![]).await?;
    assert!(nats.connection_string.starts_with("nats://"));

    let client = nats.new_test_connection(ConnectOptions::new()).await?;
    let mut subscriber = client.subscribe("greetings").await?;
    client.publish("greetings", "hello".into()).await?;
    client.flush().await?;

    let message = tokio::time::timeout(Duration::from_secs(5), subscriber.next())
        .await?
        .expect("subscription closed");
    assert_eq!(message.payload.as_ref(), b"hello");
    Ok(())
}

#[tokio::test]
async fn test_nats_jet_stream() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let nats = nats::run_test(vec![with_jet_stream()]).await?;
    let js = nats.new_test_jet_stream().await?;

    let mut events = js
        .create_stream(stream::Config {
            name: "EVENTS".to_string(),
            subjects: vec!["events.>".to_string()],
            ..Default::default()
        })
        .await?;

    js.publish("events.created", "user-1".into()).await?.await?;

    let info = events.info().await?;
    assert_eq!(info.state.messages, 1);
    Ok(())
}

#[tokio::test]
async fn test_nats_zero_timeout_fails() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let nats = nats::run_test(vec![]).await?;
    let err = nats
        .new_connection_with_timeout(Duration::ZERO, ConnectOptions::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out"));
    Ok(())
}
