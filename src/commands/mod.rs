pub mod run;

pub use run::{ConnectionInfo, OutputFormat, cmd_mongo, cmd_nats, cmd_postgres};
