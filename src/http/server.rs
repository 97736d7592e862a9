//! HTTP server setup and request entry point.
//!
//! # Responsibilities
//! - Collect routes and middleware during single-threaded setup
//! - Freeze them into one composed handler before serving
//! - Create an Axum Router whose fallback turns every request into a `Context`
//! - Wire up transport middleware (tracing, request ID, timeout, concurrency limit)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Registration takes `&mut self`; serving consumes `self`, so the route
//!   table cannot change once requests are flowing
//! - Each connection runs on its own Tokio task; a fault in one request
//!   never reaches another

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::context::{Context, TemplateLoadError, Templates};
use crate::handler::{BoxedHandler, Handler};
use crate::http::request::RequestParts;
use crate::lifecycle::{signals, Shutdown};
use crate::middleware::{BodyParser, Chain, Logging, Middleware, Recovery, StaticFiles};
use crate::routing::{PatternError, RouteTable};

/// Error type for server startup and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Templates(#[from] TemplateLoadError),
}

/// State injected into the fallback handler.
#[derive(Clone)]
struct AppState {
    entry: BoxedHandler,
    templates: Arc<Templates>,
    max_body_bytes: usize,
}

/// Request dispatcher: route table + middleware chain + listener settings.
pub struct Server {
    config: ServerConfig,
    routes: RouteTable,
    chain: Chain,
    templates: Option<Templates>,
}

impl Server {
    /// Create a server with the default chain: logging, recovery, static
    /// files (when enabled) and body parsing, in that order.
    pub fn new(config: ServerConfig) -> Self {
        let mut server = Self::bare(config);
        server.chain.push(Logging);
        server.chain.push(Recovery);
        if server.config.static_files.enabled {
            let files = StaticFiles::from_config(&server.config.static_files);
            server.chain.push(files);
        }
        server.chain.push(BodyParser);
        server
    }

    /// Create a server with an empty middleware chain.
    pub fn bare(config: ServerConfig) -> Self {
        Self {
            config,
            routes: RouteTable::new(),
            chain: Chain::new(),
            templates: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register a handler for `method` and `pattern`.
    pub fn handle<H: Handler>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, PatternError> {
        self.routes.register(method, pattern, handler)?;
        Ok(self)
    }

    pub fn get<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, PatternError> {
        self.handle(Method::GET, pattern, handler)
    }

    pub fn post<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, PatternError> {
        self.handle(Method::POST, pattern, handler)
    }

    pub fn put<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, PatternError> {
        self.handle(Method::PUT, pattern, handler)
    }

    pub fn delete<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, PatternError> {
        self.handle(Method::DELETE, pattern, handler)
    }

    /// Append a middleware. It runs inside every middleware added before it.
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.chain.push(middleware);
        self
    }

    /// Use an already loaded template set instead of `templates.root`.
    pub fn with_templates(&mut self, templates: Templates) -> &mut Self {
        self.templates = Some(templates);
        self
    }

    /// Freeze routes, middleware and templates into an Axum router.
    #[allow(deprecated)]
    pub fn into_router(self) -> Result<Router, ServerError> {
        let templates = match self.templates {
            Some(t) => t,
            None => Templates::load_dir(Path::new(&self.config.templates.root))?,
        };

        for (method, pattern) in self.routes.routes() {
            tracing::info!(method = %method, pattern = %pattern, "Route");
        }
        tracing::info!(
            routes = self.routes.len(),
            middleware = self.chain.len(),
            "Handler chain composed"
        );

        let entry = self.chain.compose(Arc::new(self.routes.into_handler()));
        let state = AppState {
            entry,
            templates: Arc::new(templates),
            max_body_bytes: self.config.listener.max_body_bytes,
        };

        let listener = &self.config.listener;
        Ok(Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(listener.request_timeout_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(listener.max_in_flight))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid)))
    }

    /// Serve on an already bound listener until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr().map_err(ServerError::Serve)?;
        let app = self.into_router()?;

        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Bind `address` and serve until Ctrl+C or SIGTERM.
    pub async fn run(self, address: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.to_string(),
                source,
            })?;

        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        tokio::spawn(async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        });

        self.serve(listener, receiver).await
    }
}

/// Build a context for the request, run the chain, return what it wrote.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let declared_len = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > state.max_body_bytes) {
        return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large\n").into_response();
    }

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "Bad Request\n").into_response();
        }
    };

    let request = RequestParts::new(parts.method, parts.uri, parts.headers, body);
    let mut ctx = Context::new(request, state.templates.clone());
    ctx.begin();

    if let Err(e) = state.entry.call(&mut ctx).await {
        // No recovery middleware in the chain; contain the fault here.
        tracing::error!(
            path = %ctx.path(),
            error = %e,
            "Unhandled fault escaped the middleware chain"
        );
        ctx.discard_response();
        ctx.render_error(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), &e);
    }

    ctx.into_response()
}
