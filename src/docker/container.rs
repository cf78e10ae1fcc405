use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use testcontainers::{ContainerAsync, GenericImage};

use super::{is_gone, normalize_port, unregister_container};

/// A started container and the host ports its exposed ports are mapped to
///
/// Clones share the underlying container. It is removed by [`Container::terminate`]
/// or once the last clone is dropped.
#[derive(Clone)]
pub struct Container {
    id: String,
    name: String,
    image: String,
    host: String,
    ports: HashMap<String, u16>,
    handle: Arc<Mutex<Option<ContainerAsync<GenericImage>>>>,
}

impl Container {
    pub(crate) fn new(
        id: String,
        name: String,
        image: String,
        host: String,
        ports: HashMap<String, u16>,
    ) -> Self {
        Self {
            id,
            name,
            image,
            host,
            ports,
            handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Tie the container's lifetime to this handle
    pub(crate) fn attach(self, handle: ContainerAsync<GenericImage>) -> Self {
        Self {
            handle: Arc::new(Mutex::new(Some(handle))),
            ..self
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Host on which the mapped ports are reachable
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ports(&self) -> &HashMap<String, u16> {
        &self.ports
    }

    /// Host port mapped to a container port such as `"5432/tcp"`
    pub fn mapped_port(&self, port: &str) -> Result<u16> {
        let port = normalize_port(port);
        self.ports
            .get(&port)
            .copied()
            .ok_or_else(|| anyhow!("Port {} is not exposed by container {}", port, self.name))
    }

    /// `proto://host:port` for a container port
    pub fn port_endpoint(&self, port: &str, proto: &str) -> Result<String> {
        let host_port = self.mapped_port(port)?;
        Ok(format!("{}://{}:{}", proto, self.host, host_port))
    }

    /// Stop and remove the container. Terminating twice is not an error.
    pub async fn terminate(&self) -> Result<()> {
        let handle = self
            .handle
            .lock()
            .map_err(|_| anyhow!("Container handle lock poisoned"))?
            .take();
        unregister_container(&self.name);

        let Some(handle) = handle else {
            return Ok(());
        };

        match handle.rm().await {
            Ok(()) => Ok(()),
            Err(e) if is_gone(&e.to_string()) => Ok(()),
            Err(e) => Err(anyhow!("Failed to remove container {}: {}", self.name, e)),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("image", &self.image)
            .field("host", &self.host)
            .field("ports", &self.ports)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> Container {
        Container::new(
            "abc123".to_string(),
            "testdeps_nats_1".to_string(),
            "nats".to_string(),
            "127.0.0.1".to_string(),
            HashMap::from([("4222/tcp".to_string(), 49160)]),
        )
    }

    #[test]
    fn test_mapped_port() {
        let container = container();
        assert_eq!(container.mapped_port("4222/tcp").unwrap(), 49160);
        assert_eq!(container.mapped_port("4222").unwrap(), 49160);
        assert!(container.mapped_port("8222/tcp").is_err());
    }

    #[test]
    fn test_port_endpoint() {
        let container = container();
        assert_eq!(
            container.port_endpoint("4222/tcp", "nats").unwrap(),
            "nats://127.0.0.1:49160"
        );
    }

    #[tokio::test]
    async fn test_terminate_without_handle() {
        let container = container();
        container.terminate().await.unwrap();
        container.terminate().await.unwrap();
    }

    #[test]
    fn test_debug_hides_handle() {
        let debug = format!("{:?}", container());
        assert!(debug.contains("testdeps_nats_1"));
        assert!(!debug.contains("handle"));
    }
}
