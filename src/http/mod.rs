//! HTTP adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body collection, Context construction)
//!     → request.rs (read-only view of the inbound request)
//!     → [composed middleware chain and route table]
//!     → response.rs (buffered sink, turned into the wire response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{CookieError, RequestParts, X_REQUEST_ID};
pub use response::ResponseSink;
pub use server::{Server, ServerError};
