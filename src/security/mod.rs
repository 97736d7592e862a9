//! Security primitives.
//!
//! The session cookie is an HMAC-SHA256 signature over a fixed message,
//! keyed by a server secret. Issuing happens at login; checking happens
//! in the auth middleware.

pub mod session;

pub use session::Signer;
