//! Docker test helpers for skipping without a daemon

use testdeps::docker::DockerManager;

/// Whether a Docker daemon is reachable; prints why a test is skipped otherwise
pub async fn docker_available() -> bool {
    let (available, details) = DockerManager::is_available_verbose().await;
    if !available {
        println!("Skipping Docker test - Docker daemon not available:\n{}", details);
    }
    available
}
