//! Tests for starting and terminating containers through the Docker daemon

use anyhow::Result;
use bollard::query_parameters::InspectContainerOptions;
use std::time::Duration;
use testdeps::docker::{registered_containers, start_container, terminate_on_drop};
use testdeps::options::{ContainerRequest, WaitFor};

use crate::helpers::docker::docker_available;

fn nats_request() -> ContainerRequest {
    ContainerRequest {
        image: "nats:2.10-alpine".to_string(),
        exposed_ports: vec!["4222/tcp".to_string()],
        wait_for: Some(WaitFor::log("Server is ready")),
        ..Default::default()
    }
}

fn unique_name(prefix: &str) -> String {
    format!("testdeps_{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

async fn container_exists(name: &str) -> Result<bool> {
    let docker = bollard::Docker::connect_with_local_defaults()?;
    Ok(docker
        .inspect_container(name, None::<InspectContainerOptions>)
        .await
        .is_ok())
}

#[tokio::test]
async fn test_start_and_terminate_container() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let container = start_container(&nats_request(), Duration::from_secs(120)).await?;
    let guard = terminate_on_drop((), &container);

    assert!(container.name().starts_with("testdeps_nats_"));
    assert!(container.mapped_port("4222").unwrap() > 0);
    assert!(registered_containers().contains(&container.name().to_string()));
    assert!(container_exists(container.name()).await?);

    container.terminate().await?;
    assert!(!registered_containers().contains(&container.name().to_string()));
    assert!(!container_exists(container.name()).await?);

    // Terminating twice is not an error
    guard.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_dropping_last_handle_removes_container() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let container = start_container(&nats_request(), Duration::from_secs(120)).await?;
    let name = container.name().to_string();
    let clone = container.clone();

    drop(container);
    assert!(container_exists(&name).await?, "a clone is still alive");

    drop(clone);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!container_exists(&name).await?, "{} should have been removed", name);
    Ok(())
}

#[tokio::test]
async fn test_readiness_timeout_removes_container() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    // Make sure the pull is not what runs out of time
    start_container(&nats_request(), Duration::from_secs(120))
        .await?
        .terminate()
        .await?;

    let name = unique_name("timeout");
    let request = ContainerRequest {
        wait_for: Some(WaitFor::log("this line is never logged")),
        name: Some(name.clone()),
        ..nats_request()
    };

    let err = start_container(&request, Duration::from_secs(5))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains(&name), "{}", message);
    // The output seen before giving up is part of the error
    assert!(message.contains("Server is ready"), "{}", message);
    assert!(message.contains("TESTCONTAINERS_COMMAND=keep"), "{}", message);

    assert!(!registered_containers().contains(&name));
    assert!(
        !container_exists(&name).await?,
        "{} should have been removed",
        name
    );
    Ok(())
}

#[tokio::test]
async fn test_crashed_container_reports_its_output() -> Result<()> {
    if !docker_available().await {
        return Ok(());
    }

    let name = unique_name("crash");
    let request = ContainerRequest {
        cmd: vec!["--no-such-flag".to_string()],
        name: Some(name.clone()),
        ..nats_request()
    };

    let err = start_container(&request, Duration::from_secs(60))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("no-such-flag"), "{}", message);
    assert!(!message.contains("(no logs available)"), "{}", message);

    assert!(!registered_containers().contains(&name));
    assert!(!container_exists(&name).await?);
    Ok(())
}

#[tokio::test]
async fn test_request_without_image_is_rejected() {
    let err = start_container(&ContainerRequest::default(), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no image"));
}
