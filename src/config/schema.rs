//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Static asset serving.
    pub static_files: StaticFilesConfig,

    /// Template loading.
    pub templates: TemplateConfig,

    /// Session cookie authentication.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests handled concurrently (backpressure).
    pub max_in_flight: usize,

    /// Maximum buffered request body size in bytes.
    pub max_body_bytes: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_in_flight: 10_000,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            request_timeout_secs: 30,
        }
    }
}

/// Static file serving configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Serve static files at all.
    pub enabled: bool,

    /// URL prefix reserved for static assets. Must start and end with '/'.
    pub url_prefix: String,

    /// Directory the prefix maps to.
    pub root: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url_prefix: "/public/".to_string(),
            root: "public".to_string(),
        }
    }
}

/// Template configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory whose markup files are compiled as templates at startup.
    pub root: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            root: "public".to_string(),
        }
    }
}

/// Session cookie authentication.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Install the authentication gate.
    pub enabled: bool,

    /// Cookie carrying the signed session token.
    pub cookie_name: String,

    /// HMAC secret used to sign session tokens.
    pub secret: String,

    /// Fixed plaintext the session token signs.
    pub message: String,

    /// Where unauthenticated requests are redirected.
    pub login_path: String,

    /// Path prefixes that skip authentication.
    pub allow_list: Vec<String>,

    /// Credentials accepted by the demo login handler.
    pub demo_username: String,
    pub demo_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cookie_name: "X_AUTH".to_string(),
            // WARNING: This is a placeholder! Change this in production.
            secret: "CHANGE_ME_IN_PRODUCTION".to_string(),
            message: "verified".to_string(),
            login_path: "/login".to_string(),
            allow_list: vec!["/login".to_string(), "/public/".to_string()],
            demo_username: "tester".to_string(),
            demo_password: "12345".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
