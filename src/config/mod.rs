//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → read once while the server is assembled
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes and middleware are built from
//!   it before serving, so there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, ListenerConfig, ObservabilityConfig, ServerConfig, StaticFilesConfig,
    TemplateConfig,
};
pub use validation::{validate_config, ValidationError};
