//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (setup, single-threaded):
//!     (method, "/users/:id", handler)
//!     → pattern.rs (parse into literal / parameter segments)
//!     → table.rs (bucket by method, replace on same pattern)
//!
//! Lookup (per request):
//!     method + path
//!     → table.rs (most specific matching pattern)
//!     → bindings merged into params → handler
//!     → no match: 404
//! ```
//!
//! # Design Decisions
//! - Routes are frozen before serving, immutable at runtime
//! - No regex: segment-by-segment comparison only
//! - Deterministic: a literal segment beats a parameter at the first
//!   position where two patterns differ; ties go to registration order

pub mod pattern;
pub mod table;

pub use pattern::{PatternError, RoutePattern, Segment};
pub use table::{Dispatch, RouteMatch, RouteTable};
