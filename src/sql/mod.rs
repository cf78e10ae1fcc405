//! SQL containers
//!
//! [`SqlContainer`] wraps a running database server reachable through a
//! connection string and provides pools and throwaway databases on top of it.
//! PostgreSQL containers are created by [`crate::postgres`].

mod client;
mod database;

use std::ops::Deref;

use crate::docker::Container;

#[derive(Debug, Clone)]
pub struct SqlContainer {
    container: Container,
    pub connection_string: String,
}

impl SqlContainer {
    pub fn new(container: Container, connection_string: impl Into<String>) -> Self {
        Self {
            container,
            connection_string: connection_string.into(),
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}

impl Deref for SqlContainer {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

/// Quote an identifier for use in SQL statements
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("MixedCase"), "\"MixedCase\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
