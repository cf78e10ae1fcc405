//! Ephemeral MongoDB, NATS and PostgreSQL containers for automated tests.
//!
//! Each backend module starts a container from a list of
//! [`options::ContainerOption`]s, waits until the server reports readiness and
//! returns a handle carrying its connection string. The `run_test` style
//! helpers wrap the handle in a [`lifecycle::TestResource`] so the container,
//! and any database created inside it, is removed when the test ends.

pub mod commands;
pub mod config;
pub mod connection;
pub mod constants;
pub mod docker;
pub mod idgen;
pub mod lifecycle;
pub mod mongo;
pub mod nats;
pub mod options;
pub mod postgres;
pub mod sql;
