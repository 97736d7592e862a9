//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware and dispatch produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the request logs
//! - Metrics are cheap (atomic increments behind the facade)

pub mod logging;
pub mod metrics;
