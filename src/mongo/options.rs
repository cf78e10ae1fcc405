use crate::config;
use crate::options::{ContainerOption, with_custom_tag};

pub const ENV_MONGO_INITDB_ROOT_USERNAME: &str = "MONGO_INITDB_ROOT_USERNAME";
pub const ENV_MONGO_INITDB_ROOT_PASSWORD: &str = "MONGO_INITDB_ROOT_PASSWORD";

/// Set `MONGO_INITDB_ROOT_USERNAME` and `MONGO_INITDB_ROOT_PASSWORD`.
pub fn with_root_user(username: impl Into<String>, password: impl Into<String>) -> ContainerOption {
    let (username, password) = (username.into(), password.into());
    Box::new(move |request| {
        request
            .env
            .insert(ENV_MONGO_INITDB_ROOT_USERNAME.to_string(), username);
        request
            .env
            .insert(ENV_MONGO_INITDB_ROOT_PASSWORD.to_string(), password);
        Ok(())
    })
}

/// Options derived from the `mongo` configuration section
pub fn configured_options(settings: &config::Mongo) -> Vec<ContainerOption> {
    let mut options = Vec::new();
    if let Some(tag) = &settings.tag {
        options.push(with_custom_tag(tag.clone()));
    }
    if let Some(root_user) = &settings.root_user {
        options.push(with_root_user(
            root_user.username.clone(),
            root_user.password.clone(),
        ));
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RootUser;
    use crate::options::{ContainerRequest, apply_options};

    #[test]
    fn test_with_root_user() {
        let mut request = ContainerRequest::default();
        with_root_user("user", "pass")(&mut request).unwrap();

        assert_eq!(request.env_var("MONGO_INITDB_ROOT_USERNAME"), Some("user"));
        assert_eq!(request.env_var("MONGO_INITDB_ROOT_PASSWORD"), Some("pass"));
    }

    #[test]
    fn test_configured_options() {
        let settings = config::Mongo {
            tag: Some("7".to_string()),
            root_user: Some(RootUser {
                username: "admin".to_string(),
                password: "secret".to_string(),
            }),
        };

        let mut request = ContainerRequest {
            image: "mongo".to_string(),
            ..Default::default()
        };
        apply_options(&mut request, configured_options(&settings)).unwrap();

        assert_eq!(request.image, "mongo:7");
        assert_eq!(request.env_var(ENV_MONGO_INITDB_ROOT_USERNAME), Some("admin"));
    }

    #[test]
    fn test_configured_options_empty() {
        assert!(configured_options(&config::Mongo::default()).is_empty());
    }
}
