//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_signal() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every subscriber wakes → server stops accepting
//!     → in-flight requests drain → serve() returns
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
