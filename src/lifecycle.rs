//! Cleanup of test resources when the test scope ends
//!
//! A [`TestResource`] owns a container, client or database handle together
//! with the async teardown that undoes it. The teardown runs when the guard is
//! dropped, so a test only has to keep the guard alive:
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn creates_users() -> anyhow::Result<()> {
//!     let postgres = testdeps::postgres::run_for_test(vec![]).await;
//!     let db = postgres.new_test_database(None).await?;
//!     sqlx::query("CREATE TABLE users (id INT)").execute(&*db).await?;
//!     Ok(())
//!     // database dropped, then container terminated
//! }
//! ```

use anyhow::{Result, anyhow};
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use tracing::{debug, error};

use crate::constants::TEARDOWN_TIMEOUT;

type Teardown = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// A resource that is cleaned up when the guard goes out of scope
///
/// Dropping the guard first drops the resource, then runs the teardown to
/// completion on a dedicated thread with its own runtime. This keeps the
/// teardown independent of the (possibly single-threaded) test runtime.
/// A failed teardown fails the test unless it is already panicking.
pub struct TestResource<T> {
    resource: Option<T>,
    teardown: Option<Teardown>,
    label: String,
}

impl<T> TestResource<T> {
    pub fn new<F, Fut>(resource: T, label: impl Into<String>, teardown: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            resource: Some(resource),
            teardown: Some(Box::new(move || Box::pin(teardown()))),
            label: label.into(),
        }
    }

    /// Guard whose only cleanup is dropping the resource
    pub fn without_teardown(resource: T, label: impl Into<String>) -> Self {
        Self {
            resource: Some(resource),
            teardown: None,
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Drop the resource and run the teardown on the current runtime
    pub async fn close(mut self) -> Result<()> {
        drop(self.resource.take());
        match self.teardown.take() {
            Some(teardown) => run_teardown(teardown, &self.label).await,
            None => Ok(()),
        }
    }

    /// Keep the resource and skip its teardown
    pub fn into_inner(mut self) -> T {
        self.teardown = None;
        self.resource
            .take()
            .expect("TestResource holds its resource until dropped")
    }
}

async fn run_teardown(teardown: Teardown, label: &str) -> Result<()> {
    tokio::time::timeout(TEARDOWN_TIMEOUT, teardown())
        .await
        .map_err(|_| anyhow!("Teardown of {} timed out", label))?
}

impl<T> Deref for TestResource<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.resource
            .as_ref()
            .expect("TestResource holds its resource until dropped")
    }
}

impl<T> DerefMut for TestResource<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.resource
            .as_mut()
            .expect("TestResource holds its resource until dropped")
    }
}

impl<T: fmt::Debug> fmt::Debug for TestResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResource")
            .field("label", &self.label)
            .field("resource", &self.resource)
            .finish()
    }
}

impl<T> Drop for TestResource<T> {
    fn drop(&mut self) {
        drop(self.resource.take());

        let Some(teardown) = self.teardown.take() else {
            return;
        };
        let label = self.label.clone();

        // Block until cleanup completes so the test runtime cannot shut down first
        let thread_label = label.clone();
        let cleanup_result = std::thread::spawn(move || -> Result<()> {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| anyhow!("Failed to create runtime for cleanup: {}", e))?;
            rt.block_on(run_teardown(teardown, &thread_label))
        })
        .join();

        match cleanup_result {
            Ok(Ok(())) => debug!("Cleaned up {}", label),
            Ok(Err(e)) => {
                error!("Failed to clean up {}: {:#}", label, e);
                if !std::thread::panicking() {
                    panic!("Failed to clean up {}: {:#}", label, e);
                }
            }
            Err(_) => error!("Cleanup of {} panicked", label),
        }
    }
}
