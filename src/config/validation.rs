//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Check path settings have the shape the middleware expects
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        ));
    }
    if config.listener.max_in_flight == 0 {
        errors.push(ValidationError::new("listener.max_in_flight", "must be greater than 0"));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    let prefix = &config.static_files.url_prefix;
    if config.static_files.enabled
        && (!prefix.starts_with('/') || !prefix.ends_with('/') || prefix == "/")
    {
        errors.push(ValidationError::new(
            "static_files.url_prefix",
            format!("must look like \"/name/\", got {:?}", prefix),
        ));
    }

    if config.auth.enabled {
        if config.auth.secret.is_empty() {
            errors.push(ValidationError::new("auth.secret", "must not be empty"));
        }
        if config.auth.cookie_name.is_empty() {
            errors.push(ValidationError::new("auth.cookie_name", "must not be empty"));
        }
        if !config.auth.login_path.starts_with('/') {
            errors.push(ValidationError::new("auth.login_path", "must start with '/'"));
        }
        // The login page itself must be reachable without a session.
        if !config
            .auth
            .allow_list
            .iter()
            .any(|p| config.auth.login_path.starts_with(p.as_str()))
        {
            errors.push(ValidationError::new(
                "auth.allow_list",
                format!("must cover the login path {:?}", config.auth.login_path),
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level {:?}", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.listener.max_in_flight = 0;
        config.static_files.url_prefix = "public".into();
        config.auth.secret.clear();
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "listener.max_in_flight",
                "static_files.url_prefix",
                "auth.secret",
                "observability.log_level",
            ]
        );
    }

    #[test]
    fn test_login_path_must_be_allowed() {
        let mut config = ServerConfig::default();
        config.auth.allow_list = vec!["/public/".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "auth.allow_list");
    }

    #[test]
    fn test_auth_checks_skipped_when_disabled() {
        let mut config = ServerConfig::default();
        config.auth.enabled = false;
        config.auth.secret.clear();
        assert!(validate_config(&config).is_ok());
    }
}
