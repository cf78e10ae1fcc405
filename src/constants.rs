use std::time::Duration;

// Standard timeout for starting a container or connecting to one
pub const DEFAULT_CONN_TIMEOUT: Duration = Duration::from_secs(120);

// Teardown of a single resource after the test has finished
pub const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(120);

// Global registry sweep
pub const CLEANUP_ALL_TIMEOUT: Duration = Duration::from_secs(10);

// Docker connection retries
pub const DOCKER_CONNECT_RETRIES: u32 = 5;
pub const DOCKER_CONNECT_RETRY_DELAY: Duration = Duration::from_millis(200);

// Number of log lines attached to a startup failure
pub const FAILURE_LOG_TAIL: usize = 50;

// Container output kept in memory for failure reports
pub const LOG_BUFFER_BYTES: usize = 64 * 1024;

// Configuration file name
pub const CONFIG_FILENAME: &str = "testdeps.yaml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_constants() {
        assert_eq!(DEFAULT_CONN_TIMEOUT, Duration::from_secs(2 * 60));
        assert!(CLEANUP_ALL_TIMEOUT > Duration::from_secs(0));
        assert!(DOCKER_CONNECT_RETRY_DELAY > Duration::from_millis(0));
    }
}
