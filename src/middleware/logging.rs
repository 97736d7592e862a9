//! Request logging middleware.
//!
//! Logs method, path, final status and elapsed time around the rest of the
//! chain and records request metrics. Never touches the response.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler, HandlerResult};
use crate::middleware::Middleware;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, Default)]
pub struct Logging;

impl Middleware for Logging {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(LoggingHandler { next })
    }
}

struct LoggingHandler {
    next: BoxedHandler,
}

impl Handler for LoggingHandler {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.method().clone();
            let path = ctx.path().to_string();
            let request_id = ctx.request().request_id().unwrap_or("unknown").to_string();

            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "Request started"
            );

            let result = self.next.call(ctx).await;
            let status = ctx.response().status();

            match &result {
                Ok(()) => tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    elapsed = ?start.elapsed(),
                    "Request completed"
                ),
                Err(e) => tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error = %e,
                    elapsed = ?start.elapsed(),
                    "Request failed with unhandled fault"
                ),
            }
            metrics::record_request(method.as_str(), status.as_u16(), start);

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerError;
    use crate::middleware::test_support::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_passes_through_response() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let handler = Logging.wrap(recording("T", &log));

        let mut ctx = get("/about");
        handler.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().body(), b"T");
        assert_eq!(*log.lock().unwrap(), vec!["T"]);
    }

    #[tokio::test]
    async fn test_propagates_fault() {
        let failing: BoxedHandler = Arc::new(crate::handler::handler_fn(|_ctx| {
            Box::pin(async move { Err(HandlerError::fault("boom")) })
        }));
        let handler = Logging.wrap(failing);

        let mut ctx = get("/");
        assert!(matches!(
            handler.call(&mut ctx).await,
            Err(HandlerError::Fault(_))
        ));
    }
}
