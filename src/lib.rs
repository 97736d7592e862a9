//! Minimal HTTP dispatcher.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (Axum fallback, body collected, Context built)
//!                         │
//!                         ▼
//!                     middleware chain (outermost first)
//!                     Logging → Recovery → StaticFiles → BodyParser → [Auth, ...]
//!                         │
//!                         ▼
//!                     routing::Dispatch (method + pattern lookup, bindings → params)
//!                         │
//!                         ▼
//!                     route handler (writes through Context)
//!                         │
//!     Client Response     ▼
//!     ◀────────────── ResponseSink → axum Response
//! ```
//!
//! Routes and middleware are registered on [`Server`] during startup and
//! frozen into a single composed handler before the first request.

pub mod config;
pub mod context;
pub mod demo;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::ServerConfig;
pub use context::Context;
pub use handler::{handler_fn, BoxedHandler, Handler, HandlerError, HandlerResult};
pub use http::{Server, ServerError};
pub use lifecycle::Shutdown;
pub use middleware::Middleware;
