//! Request handlers.
//!
//! # Responsibilities
//! - Define the single capability every handler has: process a `Context`
//! - Adapt plain closures and functions into handlers
//! - Define the fault channel (`HandlerError`) caught by the recovery middleware
//!
//! # Design Decisions
//! - Handlers return `Result<(), HandlerError>`; `Ok` means the response
//!   side effects are done, `Err` is an unhandled fault
//! - Handlers are shared behind `Arc` so a composed chain is cheap to clone
//!   into every connection task

use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::context::{Context, ParamError};
use crate::middleware::body::BodyError;

/// Outcome of running a handler.
pub type HandlerResult = Result<(), HandlerError>;

/// A handler shared between connection tasks.
pub type BoxedHandler = Arc<dyn Handler>;

/// Unhandled failure raised by application logic or a middleware.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler fault: {0}")]
    Fault(String),

    #[error("handler panicked: {0}")]
    Panic(String),

    #[error("failed to parse request body: {0}")]
    BodyParse(#[from] BodyError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    /// Build a generic fault from any message.
    pub fn fault(message: impl Into<String>) -> Self {
        HandlerError::Fault(message.into())
    }
}

/// Processes a request context and produces side effects on its response.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (**self).call(ctx)
    }
}

/// Handler built from a closure, see [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap a closure returning a boxed future as a [`Handler`].
///
/// ```ignore
/// let about = handler_fn(|ctx| Box::pin(async move {
///     ctx.write_str("about!\n");
///     Ok(())
/// }));
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    HandlerFn { f }
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (self.f)(ctx)
    }
}
