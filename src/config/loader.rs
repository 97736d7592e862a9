//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [auth]
            secret = "s3cret"
            allow_list = ["/login", "/public/", "/about"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.listener.max_in_flight, 10_000);
        assert_eq!(config.auth.secret, "s3cret");
        assert_eq!(config.auth.cookie_name, "X_AUTH");
        assert_eq!(config.auth.allow_list.len(), 3);
        assert_eq!(config.static_files.url_prefix, "/public/");
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            parse_config("[listener"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation_error_message_lists_all() {
        let err = parse_config(
            r#"
            [listener]
            bind_address = "nope"
            max_in_flight = 0
            "#,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("listener.bind_address"));
        assert!(message.contains("listener.max_in_flight"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_config(Path::new("/no/such/config.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
