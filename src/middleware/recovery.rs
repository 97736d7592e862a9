//! Fault recovery middleware.
//!
//! Runs the rest of the chain inside a panic boundary. A panic or an
//! `Err(HandlerError)` from downstream is logged, any buffered output is
//! dropped, and the request is answered with exactly one generic 500.
//! The fault never leaves this handler.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler, HandlerError, HandlerResult};
use crate::middleware::Middleware;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery;

impl Middleware for Recovery {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(RecoveryHandler { next })
    }
}

struct RecoveryHandler {
    next: BoxedHandler,
}

impl Handler for RecoveryHandler {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let outcome = AssertUnwindSafe(self.next.call(ctx)).catch_unwind().await;
            let fault = match outcome {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) => e,
                Err(payload) => HandlerError::Panic(panic_message(payload.as_ref())),
            };

            tracing::error!(
                method = %ctx.method(),
                path = %ctx.path(),
                error = %fault,
                "Recovered from handler fault"
            );
            metrics::record_recovered_fault();

            ctx.discard_response();
            ctx.render_error(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), &fault);
            Ok(())
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
