use crate::config;
use crate::options::{ContainerOption, with_custom_tag, with_env};

pub const ENV_POSTGRES_HOST_AUTH_METHOD: &str = "POSTGRES_HOST_AUTH_METHOD";
pub const ENV_POSTGRES_USER: &str = "POSTGRES_USER";
pub const ENV_POSTGRES_PASSWORD: &str = "POSTGRES_PASSWORD";
pub const ENV_POSTGRES_DB: &str = "POSTGRES_DB";

/// Accept every connection without a password.
pub fn with_trust() -> ContainerOption {
    with_env(ENV_POSTGRES_HOST_AUTH_METHOD, "trust")
}

/// Sets `POSTGRES_PASSWORD`.
pub fn with_password(password: impl Into<String>) -> ContainerOption {
    with_env(ENV_POSTGRES_PASSWORD, password)
}

/// Sets `POSTGRES_USER`.
pub fn with_user(user: impl Into<String>) -> ContainerOption {
    with_env(ENV_POSTGRES_USER, user)
}

/// Sets `POSTGRES_DB`, the database created when the server initializes.
pub fn with_initial_database(name: impl Into<String>) -> ContainerOption {
    with_env(ENV_POSTGRES_DB, name)
}

/// Options derived from the `postgres` configuration section
pub fn configured_options(settings: &config::Postgres) -> Vec<ContainerOption> {
    let mut options = Vec::new();
    if let Some(tag) = &settings.tag {
        options.push(with_custom_tag(tag.clone()));
    }
    if let Some(user) = &settings.user {
        options.push(with_user(user.clone()));
    }
    if let Some(password) = &settings.password {
        options.push(with_password(password.clone()));
    }
    if let Some(database) = &settings.database {
        options.push(with_initial_database(database.clone()));
    }
    if settings.trust {
        options.push(with_trust());
    }
    options
}
