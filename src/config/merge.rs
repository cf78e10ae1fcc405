use crate::config::types::*;

/// Trait for merging optional configuration values
pub trait Merge<T> {
    fn merge(self, other: T) -> T;
}

impl<T> Merge<Option<T>> for Option<T> {
    fn merge(self, other: Option<T>) -> Option<T> {
        other.or(self)
    }
}

impl Merge<ConfigInput> for ConfigInput {
    fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            connect_timeout_secs: self.connect_timeout_secs.merge(other.connect_timeout_secs),
            mongo: match (self.mongo, other.mongo) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
            nats: match (self.nats, other.nats) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
            postgres: match (self.postgres, other.postgres) {
                (None, None) => None,
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (Some(a), Some(b)) => Some(a.merge_with(b)),
            },
        }
    }
}

// Custom merge implementations for complex types
impl MongoInput {
    pub fn merge_with(self, other: MongoInput) -> MongoInput {
        MongoInput {
            tag: other.tag.or(self.tag),
            root_username: other.root_username.or(self.root_username),
            root_password: other.root_password.or(self.root_password),
        }
    }
}

impl NatsInput {
    pub fn merge_with(self, other: NatsInput) -> NatsInput {
        NatsInput {
            tag: other.tag.or(self.tag),
            jetstream: other.jetstream.or(self.jetstream),
        }
    }
}

impl PostgresInput {
    pub fn merge_with(self, other: PostgresInput) -> PostgresInput {
        PostgresInput {
            tag: other.tag.or(self.tag),
            user: other.user.or(self.user),
            password: other.password.or(self.password),
            database: other.database.or(self.database),
            trust: other.trust.or(self.trust),
        }
    }
}
