use clap::Args;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw configuration input - all fields Optional for merging
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigInput {
    pub connect_timeout_secs: Option<u64>,
    pub mongo: Option<MongoInput>,
    pub nats: Option<NatsInput>,
    pub postgres: Option<PostgresInput>,
}

/// Resolved configuration with all defaults applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub connect_timeout: ConnectTimeout,
    pub mongo: Mongo,
    pub nats: Nats,
    pub postgres: Postgres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectTimeout(pub Duration);

// MongoDB configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MongoInput {
    pub tag: Option<String>,
    pub root_username: Option<String>,
    pub root_password: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Mongo {
    pub tag: Option<String>,
    pub root_user: Option<RootUser>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootUser {
    pub username: String,
    pub password: String,
}

// NATS configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NatsInput {
    pub tag: Option<String>,
    pub jetstream: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct Nats {
    pub tag: Option<String>,
    pub jetstream: bool,
}

// PostgreSQL configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PostgresInput {
    pub tag: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub trust: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct Postgres {
    pub tag: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub trust: bool,
}

// CLI argument groups for command-specific options
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    #[arg(long, help = "Seconds to wait for the container to become ready")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct MongoArgs {
    #[arg(long, help = "Image tag for the mongo image")]
    pub tag: Option<String>,

    #[arg(long, requires = "root_password", help = "Root username")]
    pub root_username: Option<String>,

    #[arg(long, requires = "root_username", help = "Root password")]
    pub root_password: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct NatsArgs {
    #[arg(long, help = "Image tag for the nats image")]
    pub tag: Option<String>,

    #[arg(long, help = "Enable JetStream (nats -js)")]
    pub jetstream: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct PostgresArgs {
    #[arg(long, help = "Image tag for the postgres image")]
    pub tag: Option<String>,

    #[arg(long, help = "Superuser name (POSTGRES_USER)")]
    pub user: Option<String>,

    #[arg(long, help = "Superuser password (POSTGRES_PASSWORD)")]
    pub password: Option<String>,

    #[arg(long, help = "Database created at startup (POSTGRES_DB)")]
    pub database: Option<String>,

    #[arg(long, help = "Accept connections without a password")]
    pub trust: bool,
}

// Conversion functions from CLI args to config input
impl From<CommonArgs> for ConfigInput {
    fn from(args: CommonArgs) -> Self {
        Self {
            connect_timeout_secs: args.timeout_secs,
            ..Default::default()
        }
    }
}

impl From<MongoArgs> for MongoInput {
    fn from(args: MongoArgs) -> Self {
        Self {
            tag: args.tag,
            root_username: args.root_username,
            root_password: args.root_password,
        }
    }
}

impl From<NatsArgs> for NatsInput {
    fn from(args: NatsArgs) -> Self {
        Self {
            tag: args.tag,
            jetstream: if args.jetstream { Some(true) } else { None },
        }
    }
}

impl From<PostgresArgs> for PostgresInput {
    fn from(args: PostgresArgs) -> Self {
        Self {
            tag: args.tag,
            user: args.user,
            password: args.password,
            database: args.database,
            trust: if args.trust { Some(true) } else { None },
        }
    }
}
