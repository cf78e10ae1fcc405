//! Docker container management for test dependencies
//!
//! Containers are pulled, started and probed for readiness by testcontainers.
//! The bollard connection managed here checks that a daemon is reachable and
//! removes containers by name, which also covers containers whose start was
//! interrupted before a handle existed.

mod container;
mod logs;

pub use container::Container;
use logs::LogTail;

use anyhow::{Result, anyhow};
use bollard::Docker;
use bollard::query_parameters::{RemoveContainerOptions, StopContainerOptions};
use std::collections::HashMap;
use std::time::Duration;
use testcontainers::core::logs::LogFrame;
use testcontainers::core::wait::LogWaitStrategy;
use testcontainers::core::{ContainerPort, WaitFor as ReadyCondition};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tracing::{debug, info, warn};

use crate::constants::{
    CLEANUP_ALL_TIMEOUT, DOCKER_CONNECT_RETRIES, DOCKER_CONNECT_RETRY_DELAY, FAILURE_LOG_TAIL,
};
use crate::lifecycle::TestResource;
use crate::options::{ContainerRequest, WaitFor};

/// Docker daemon connection used for availability checks and cleanup
#[derive(Clone)]
pub struct DockerManager {
    docker: Docker,
}

impl DockerManager {
    /// Check if Docker is available with detailed debug information
    pub async fn is_available_verbose() -> (bool, String) {
        match Self::try_connect_verbose().await {
            Ok((_, debug_info)) => (true, debug_info),
            Err(e) => (false, format!("Docker not available: {}", e)),
        }
    }

    /// Create a new Docker manager with retry logic
    pub async fn new() -> Result<Self> {
        for attempt in 0..=DOCKER_CONNECT_RETRIES {
            match Self::try_connect().await {
                Ok(docker_manager) => {
                    if attempt > 0 {
                        debug!(
                            "Connected to Docker (after {} retry{})",
                            attempt,
                            if attempt == 1 { "" } else { "ies" }
                        );
                    }
                    return Ok(docker_manager);
                }
                Err(e) => {
                    if attempt < DOCKER_CONNECT_RETRIES {
                        if attempt == 0 {
                            debug!("Docker not ready, retrying: {}", e);
                        }
                        tokio::time::sleep(DOCKER_CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        }

        let (_, debug_info) = Self::is_available_verbose().await;

        Err(anyhow!(
            "Failed to connect to Docker after {} attempts.\n\n{}\nMake sure Docker is running or set DOCKER_HOST",
            DOCKER_CONNECT_RETRIES + 1,
            debug_info
        ))
    }

    /// Single attempt to connect to Docker (used internally by new())
    async fn try_connect() -> Result<Self> {
        for (_description, socket_path) in Self::get_docker_socket_candidates() {
            if let Ok(docker) = Self::try_socket_path(&socket_path).await {
                return Ok(Self::from_docker(docker));
            }
        }

        // Bollard's default detection also understands tcp:// DOCKER_HOST values
        let docker = Docker::connect_with_local_defaults().map_err(|e| {
            anyhow!(
                "Failed to connect to Docker daemon after trying all socket paths: {}",
                e
            )
        })?;

        docker
            .ping()
            .await
            .map_err(|e| anyhow!("Docker daemon not responding: {}", e))?;

        Ok(Self::from_docker(docker))
    }

    fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }

    /// Single attempt to connect to Docker with verbose debug information
    async fn try_connect_verbose() -> Result<(Self, String)> {
        let mut debug_info = String::new();
        debug_info.push_str("Docker socket detection:\n");

        for (description, socket_path) in &Self::get_docker_socket_candidates() {
            debug_info.push_str(&format!("  • {}: ", description));
            match Self::try_socket_path(socket_path).await {
                Ok(docker) => {
                    debug_info.push_str(&format!("connected ({})\n", socket_path));
                    return Ok((Self::from_docker(docker), debug_info));
                }
                Err(e) => {
                    debug_info.push_str(&format!("failed - {}\n", e));
                }
            }
        }

        debug_info.push_str("  • Bollard default detection: ");
        match Docker::connect_with_local_defaults() {
            Ok(docker) => match docker.ping().await {
                Ok(_) => {
                    debug_info.push_str("connected\n");
                    return Ok((Self::from_docker(docker), debug_info));
                }
                Err(e) => {
                    debug_info.push_str(&format!("failed to ping - {}\n", e));
                }
            },
            Err(e) => {
                debug_info.push_str(&format!("failed to connect - {}\n", e));
            }
        }

        Err(anyhow!(
            "Failed to connect to Docker daemon after trying all methods:\n{}",
            debug_info
        ))
    }

    /// Get list of Docker socket candidates to try in priority order
    fn get_docker_socket_candidates() -> Vec<(String, String)> {
        let mut candidates = Vec::new();

        if let Ok(docker_host) = std::env::var("DOCKER_HOST") {
            candidates.push(("DOCKER_HOST environment variable".to_string(), docker_host));
        }

        #[cfg(target_os = "macos")]
        {
            if let Ok(home) = std::env::var("HOME") {
                candidates.push((
                    "macOS Docker Desktop".to_string(),
                    format!("unix://{}/.docker/run/docker.sock", home),
                ));
                candidates.push((
                    "Colima".to_string(),
                    format!("unix://{}/.colima/default/docker.sock", home),
                ));
                candidates.push((
                    "OrbStack".to_string(),
                    format!("unix://{}/.orbstack/run/docker.sock", home),
                ));
            }
        }

        candidates.push((
            "Standard Linux location".to_string(),
            "unix:///var/run/docker.sock".to_string(),
        ));

        candidates
    }

    /// Try connecting to a specific socket path
    async fn try_socket_path(socket_path: &str) -> Result<Docker> {
        let Some(socket_file) = socket_path.strip_prefix("unix://") else {
            return Err(anyhow!("Unsupported socket protocol: {}", socket_path));
        };

        let docker = Docker::connect_with_socket(socket_file, 120, bollard::API_DEFAULT_VERSION)
            .map_err(|e| anyhow!("Failed to connect to socket {}: {}", socket_path, e))?;

        docker
            .ping()
            .await
            .map_err(|e| anyhow!("Socket {} not responding: {}", socket_path, e))?;

        Ok(docker)
    }

    /// Stop and remove a container by id or name, treating an already removed
    /// container as success.
    pub async fn terminate(&self, container_id: &str) -> Result<()> {
        match self.stop_container(container_id, true).await {
            Ok(()) => Ok(()),
            Err(e) if is_gone(&e.to_string()) => {
                debug!("Container {} already removed", container_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Stop and optionally remove a container.
    /// Resilient to already-stopped containers: if stop fails, still attempts force-remove.
    pub async fn stop_container(&self, container_id: &str, remove: bool) -> Result<()> {
        let stop_result = self
            .docker
            .stop_container(container_id, None::<StopContainerOptions>)
            .await;

        match stop_result {
            Ok(()) => {
                if remove {
                    // A dropped handle may already be removing it
                    if let Err(e) = self.remove_container(container_id, false).await
                        && !is_gone(&e.to_string())
                    {
                        return Err(e);
                    }
                }
            }
            Err(ref e) => {
                if is_gone(&e.to_string()) {
                    unregister_container(container_id);
                    return Err(anyhow!("Failed to stop container: {}", e));
                }

                // Container may have crashed or exited; still try to force-remove
                if remove {
                    self.remove_container(container_id, true).await?;
                    unregister_container(container_id);
                    return Ok(());
                }

                unregister_container(container_id);
                return Err(anyhow!("Failed to stop container: {}", e));
            }
        }

        unregister_container(container_id);

        Ok(())
    }

    /// Remove a container
    async fn remove_container(&self, container_id: &str, force: bool) -> Result<()> {
        let remove_options = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.docker
            .remove_container(container_id, Some(remove_options))
            .await
            .map_err(|e| anyhow!("Failed to remove container: {}", e))?;

        Ok(())
    }
}

/// Start a container for the request and wait until it is ready.
///
/// One deadline covers the pull, the start and the readiness check. The
/// container is registered for cleanup under its name before it is created,
/// and any failure after that point removes it again. Startup errors carry
/// the last lines of the container output.
pub async fn start_container(request: &ContainerRequest, timeout: Duration) -> Result<Container> {
    if request.image.is_empty() {
        return Err(anyhow!("Container request has no image"));
    }

    let container_name = request
        .name
        .clone()
        .unwrap_or_else(|| generated_container_name(&request.image));
    let logs = LogTail::new();
    let container_request = build_container_request(request, &container_name, timeout, &logs)?;

    debug!("Starting container {} ({})", container_name, request.image);
    register_container(container_name.clone());

    let started = match tokio::time::timeout(timeout, container_request.start()).await {
        Ok(Ok(started)) => started,
        Ok(Err(e)) => {
            // A container that was created but never handed out is only known by name
            remove_by_name(&container_name).await;
            return Err(startup_error(
                anyhow!("Container {} failed to start: {}", container_name, e),
                &logs,
            ));
        }
        Err(_) => {
            remove_by_name(&container_name).await;
            return Err(startup_error(
                anyhow!("Container {} was not ready after {:?}", container_name, timeout),
                &logs,
            ));
        }
    };

    let (host, ports) = match mapped_endpoints(&started, &request.exposed_ports).await {
        Ok(endpoints) => endpoints,
        Err(e) => {
            unregister_container(&container_name);
            if let Err(rm_err) = started.rm().await {
                warn!("Failed to remove container {}: {}", container_name, rm_err);
            }
            return Err(e);
        }
    };

    let container = Container::new(
        started.id().to_string(),
        container_name,
        request.image.clone(),
        host,
        ports,
    )
    .attach(started);
    info!("Container ready: {} ({})", container.name(), container.image());

    Ok(container)
}

fn build_container_request(
    request: &ContainerRequest,
    container_name: &str,
    timeout: Duration,
    logs: &LogTail,
) -> Result<testcontainers::ContainerRequest<GenericImage>> {
    let (repository, tag) = split_image(&request.image);
    let mut image = GenericImage::new(repository, tag);
    for port in &request.exposed_ports {
        image = image.with_exposed_port(container_port(port)?);
    }
    if let Some(wait_for) = &request.wait_for {
        image = image.with_wait_for(ready_condition(wait_for));
    }

    let consumer = logs.clone();
    let mut container_request = image
        .with_container_name(container_name)
        .with_startup_timeout(timeout)
        .with_log_consumer(move |frame: &LogFrame| consumer.push(frame.bytes()));

    for (key, value) in &request.env {
        container_request = container_request.with_env_var(key, value);
    }
    if !request.cmd.is_empty() {
        container_request = container_request.with_cmd(&request.cmd);
    }

    Ok(container_request)
}

async fn mapped_endpoints(
    started: &ContainerAsync<GenericImage>,
    exposed_ports: &[String],
) -> Result<(String, HashMap<String, u16>)> {
    let host = started
        .get_host()
        .await
        .map_err(|e| anyhow!("Failed to resolve container host: {}", e))?
        .to_string();

    let mut ports = HashMap::new();
    for port in exposed_ports {
        let host_port = started
            .get_host_port_ipv4(container_port(port)?)
            .await
            .map_err(|e| anyhow!("Port {} is not bound: {}", port, e))?;
        ports.insert(normalize_port(port), host_port);
    }

    Ok((host, ports))
}

fn startup_error(error: anyhow::Error, logs: &LogTail) -> anyhow::Error {
    anyhow!(
        "{error}\n\n\
         Container logs (last {FAILURE_LOG_TAIL} lines):\n{}\n\n\
         Tip: Re-run with TESTCONTAINERS_COMMAND=keep to keep containers alive for debugging.",
        logs.tail()
    )
}

async fn remove_by_name(container_name: &str) {
    let removed = match DockerManager::new().await {
        Ok(manager) => manager.terminate(container_name).await,
        Err(e) => Err(e),
    };
    if let Err(e) = removed {
        warn!("Failed to remove container {}: {}", container_name, e);
    }
    unregister_container(container_name);
}

/// Guard that terminates the container once the test scope ends
pub fn terminate_on_drop<T>(resource: T, container: &Container) -> TestResource<T> {
    let to_terminate = container.clone();
    TestResource::new(
        resource,
        format!("container {}", container.name()),
        move || async move { to_terminate.terminate().await },
    )
}

/// `"5432"` and `"5432/tcp"` name the same port
pub fn normalize_port(port: &str) -> String {
    if port.contains('/') {
        port.to_string()
    } else {
        format!("{}/tcp", port)
    }
}

fn generated_container_name(image: &str) -> String {
    let repository = image.split(':').next().unwrap_or(image);
    let repository: String = repository
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("testdeps_{}_{}", repository, uuid::Uuid::new_v4().simple())
}

fn is_gone(error_msg: &str) -> bool {
    error_msg.contains("404")
        || error_msg.contains("No such container")
        || error_msg.contains("is already in progress")
}

/// Split `repository[:tag]`; a registry port is not a tag
fn split_image(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((repository, tag)) if !tag.contains('/') => (repository, tag),
        _ => (image, "latest"),
    }
}

fn container_port(port: &str) -> Result<ContainerPort> {
    let normalized = normalize_port(port);
    let (number, protocol) = normalized
        .split_once('/')
        .ok_or_else(|| anyhow!("Invalid port '{}'", port))?;
    let number = number
        .parse::<u16>()
        .map_err(|e| anyhow!("Invalid port '{}': {}", port, e))?;

    match protocol {
        "tcp" => Ok(ContainerPort::Tcp(number)),
        "udp" => Ok(ContainerPort::Udp(number)),
        "sctp" => Ok(ContainerPort::Sctp(number)),
        other => Err(anyhow!("Unsupported protocol '{}' in port '{}'", other, port)),
    }
}

fn ready_condition(wait_for: &WaitFor) -> ReadyCondition {
    match wait_for {
        WaitFor::Log {
            message,
            occurrence,
        } => ReadyCondition::log(
            LogWaitStrategy::stdout_or_stderr(message.as_str()).with_times(*occurrence),
        ),
    }
}

use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

/// Global registry of container names awaiting cleanup
static CONTAINER_REGISTRY: Lazy<Arc<Mutex<Vec<String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(Vec::new())));

/// Register a container for cleanup at process exit
pub fn register_container(container_name: String) {
    if let Ok(mut registry) = CONTAINER_REGISTRY.lock() {
        registry.push(container_name);
    }
}

/// Unregister a container (when manually cleaned up)
pub fn unregister_container(container_name: &str) {
    if let Ok(mut registry) = CONTAINER_REGISTRY.lock() {
        registry.retain(|name| name != container_name);
    }
}

/// Names of the containers still awaiting cleanup
pub fn registered_containers() -> Vec<String> {
    CONTAINER_REGISTRY
        .lock()
        .map(|registry| registry.clone())
        .unwrap_or_default()
}

/// Clean up all registered containers
pub async fn cleanup_all_containers() -> Result<()> {
    let container_names = {
        let mut registry = CONTAINER_REGISTRY
            .lock()
            .map_err(|_| anyhow!("Container registry lock poisoned"))?;
        std::mem::take(&mut *registry)
    };

    if container_names.is_empty() {
        return Ok(());
    }

    info!(
        "Cleaning up {} registered container(s)",
        container_names.len()
    );

    let cleanup_tasks: Vec<_> = container_names
        .into_iter()
        .map(|name| {
            tokio::spawn(async move {
                match DockerManager::new().await {
                    Ok(manager) => match manager.terminate(&name).await {
                        Ok(()) => debug!("Cleaned up container: {}", name),
                        Err(e) => warn!("Failed to cleanup container {}: {}", name, e),
                    },
                    Err(e) => warn!(
                        "Failed to create Docker manager for cleanup of {}: {}",
                        name, e
                    ),
                }
            })
        })
        .collect();

    if tokio::time::timeout(
        CLEANUP_ALL_TIMEOUT,
        futures_util::future::join_all(cleanup_tasks),
    )
    .await
    .is_err()
    {
        warn!(
            "Container cleanup timed out after {} seconds",
            CLEANUP_ALL_TIMEOUT.as_secs()
        );
    }

    Ok(())
}
