use crate::config::{merge::Merge, types::*};
use anyhow::{Result, anyhow};
use std::time::Duration;

pub const ENV_CONFIG_FILE: &str = "TESTDEPS_CONFIG";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "TESTDEPS_CONNECT_TIMEOUT_SECS";
pub const ENV_MONGO_TAG: &str = "TESTDEPS_MONGO_TAG";
pub const ENV_NATS_TAG: &str = "TESTDEPS_NATS_TAG";
pub const ENV_POSTGRES_TAG: &str = "TESTDEPS_POSTGRES_TAG";

pub struct ConfigBuilder {
    config_input: ConfigInput,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    pub fn with_env(mut self, env_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(env_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    pub fn resolve(self) -> Result<Config> {
        let defaults = Config::default();

        Ok(Config {
            connect_timeout: self.resolve_connect_timeout(defaults.connect_timeout)?,
            mongo: self.resolve_mongo()?,
            nats: self.resolve_nats(),
            postgres: self.resolve_postgres(),
        })
    }

    fn resolve_connect_timeout(&self, default: ConnectTimeout) -> Result<ConnectTimeout> {
        match self.config_input.connect_timeout_secs {
            Some(0) => Err(anyhow!("connect_timeout_secs must be greater than zero")),
            Some(secs) => Ok(ConnectTimeout(Duration::from_secs(secs))),
            None => Ok(default),
        }
    }

    fn resolve_mongo(&self) -> Result<Mongo> {
        let mongo_input = self.config_input.mongo.as_ref();

        let root_user = match (
            mongo_input.and_then(|m| m.root_username.as_ref()),
            mongo_input.and_then(|m| m.root_password.as_ref()),
        ) {
            (Some(username), Some(password)) => Some(RootUser {
                username: username.clone(),
                password: password.clone(),
            }),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "mongo root_username and root_password must be set together"
                ));
            }
        };

        Ok(Mongo {
            tag: mongo_input.and_then(|m| m.tag.clone()),
            root_user,
        })
    }

    fn resolve_nats(&self) -> Nats {
        let nats_input = self.config_input.nats.as_ref();

        Nats {
            tag: nats_input.and_then(|n| n.tag.clone()),
            jetstream: nats_input.and_then(|n| n.jetstream).unwrap_or(false),
        }
    }

    fn resolve_postgres(&self) -> Postgres {
        let pg_input = self.config_input.postgres.as_ref();

        Postgres {
            tag: pg_input.and_then(|p| p.tag.clone()),
            user: pg_input.and_then(|p| p.user.clone()),
            password: pg_input.and_then(|p| p.password.clone()),
            database: pg_input.and_then(|p| p.database.clone()),
            trust: pg_input.and_then(|p| p.trust).unwrap_or(false),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigInput {
    /// Read the `TESTDEPS_*` environment variables
    pub fn from_env() -> Result<ConfigInput> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<ConfigInput> {
        let connect_timeout_secs = lookup(ENV_CONNECT_TIMEOUT_SECS)
            .map(|v| {
                v.trim().parse::<u64>().map_err(|e| {
                    anyhow!("Invalid {} value '{}': {}", ENV_CONNECT_TIMEOUT_SECS, v, e)
                })
            })
            .transpose()?;

        Ok(ConfigInput {
            connect_timeout_secs,
            mongo: lookup(ENV_MONGO_TAG).map(|tag| MongoInput {
                tag: Some(tag),
                ..Default::default()
            }),
            nats: lookup(ENV_NATS_TAG).map(|tag| NatsInput {
                tag: Some(tag),
                ..Default::default()
            }),
            postgres: lookup(ENV_POSTGRES_TAG).map(|tag| PostgresInput {
                tag: Some(tag),
                ..Default::default()
            }),
        })
    }
}
