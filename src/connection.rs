use anyhow::{Result, anyhow};
use std::future::Future;
use std::time::Duration;

/// Mask password in a connection URL for display
pub fn mask_url_password(url: &str) -> String {
    let Some((protocol, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    // Check if there's user info (user:pass@host or user@host)
    if let Some(at_pos) = rest.rfind('@') {
        let user_info = &rest[..at_pos];
        let host_and_path = &rest[at_pos + 1..];

        if let Some((username, _password)) = user_info.split_once(':') {
            return format!("{}://{}:***@{}", protocol, username, host_and_path);
        }
    }

    url.to_string()
}

/// Race a connection attempt against a deadline.
///
/// An elapsed deadline yields a timeout error; an error from the attempt
/// itself is returned unchanged. A zero timeout fails without polling.
pub async fn connect_with_timeout<T, F>(timeout: Duration, label: &str, connect: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if timeout.is_zero() {
        return Err(anyhow!("Connection to {} timed out", label));
    }

    tokio::time::timeout(timeout, connect)
        .await
        .map_err(|_| anyhow!("Connection to {} timed out after {:?}", label, timeout))?
}
