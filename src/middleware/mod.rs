//! Middleware chain.
//!
//! # Data Flow
//! ```text
//! Registration order:  [logging, recovery, static_files, body, auth]
//!
//! Request  → logging → recovery → static_files → body → auth → dispatch
//! Response ← logging ← recovery ← static_files ← body ← auth ←
//! ```
//!
//! # Design Decisions
//! - A middleware is anything that can wrap a handler into a new handler
//! - Composition is a reverse fold done once at startup: the first
//!   registered middleware ends up outermost
//! - Not calling `next` is a normal outcome (short-circuit), not an error

pub mod auth;
pub mod body;
pub mod logging;
pub mod recovery;
pub mod static_files;

use std::sync::Arc;

use crate::handler::BoxedHandler;

pub use auth::Auth;
pub use body::BodyParser;
pub use logging::Logging;
pub use recovery::Recovery;
pub use static_files::StaticFiles;

/// Transforms a handler into a handler with extra behavior around it.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self(next)
    }
}

/// Wrap `terminal` so that `middlewares[0]` is outermost:
/// `m[0].wrap(m[1].wrap(... m[n-1].wrap(terminal)))`.
pub fn compose(terminal: BoxedHandler, middlewares: &[Arc<dyn Middleware>]) -> BoxedHandler {
    middlewares
        .iter()
        .rev()
        .fold(terminal, |next, middleware| middleware.wrap(next))
}

/// Ordered list of middleware, in registration order.
#[derive(Clone, Default)]
pub struct Chain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware; it runs inside every one registered before it.
    pub fn push<M: Middleware>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    pub fn push_shared(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn compose(&self, terminal: BoxedHandler) -> BoxedHandler {
        compose(terminal, &self.middlewares)
    }
}
