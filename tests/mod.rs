// Integration tests for testdeps

pub mod cli;
pub mod component;
pub mod fixtures;
pub mod helpers;
pub mod integration;
