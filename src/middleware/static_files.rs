//! Static file middleware.
//!
//! # Responsibilities
//! - Serve files below a fixed root for paths under the reserved prefix
//! - Short-circuit: requests under the prefix never reach the router
//!
//! # Design Decisions
//! - Only plain path components are accepted; `..`, `.` and empty
//!   components are answered with 404, so the root cannot be escaped
//! - Content type comes from the file extension
//! - A path that does not name a readable file (missing, a directory, or
//!   under a non-directory) is 404; any other read failure is a fault

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method, StatusCode};
use futures_util::future::BoxFuture;

use crate::config::StaticFilesConfig;
use crate::context::Context;
use crate::handler::{BoxedHandler, Handler, HandlerError, HandlerResult};
use crate::middleware::Middleware;

#[derive(Debug, Clone)]
pub struct StaticFiles {
    prefix: String,
    root: PathBuf,
}

impl StaticFiles {
    /// Serve `root` under `prefix`, e.g. `/public/` → `./public`.
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            root: root.into(),
        }
    }

    pub fn from_config(config: &StaticFilesConfig) -> Self {
        Self::new(config.url_prefix.clone(), &config.root)
    }

    /// Map a request path under the prefix to a file below the root.
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for part in relative.split('/') {
            if part.is_empty() || part == "." || part == ".." || part.contains('\\') {
                return None;
            }
            path.push(part);
        }
        Some(path)
    }
}

impl Middleware for StaticFiles {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(StaticFilesHandler {
            files: self.clone(),
            next,
        })
    }
}

struct StaticFilesHandler {
    files: StaticFiles,
    next: BoxedHandler,
}

impl Handler for StaticFilesHandler {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let Some(relative) = ctx.path().strip_prefix(self.files.prefix.as_str()) else {
                return self.next.call(ctx).await;
            };

            let method = ctx.method().clone();
            if method != Method::GET && method != Method::HEAD {
                ctx.set_header(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
                ctx.render_error(
                    StatusCode::METHOD_NOT_ALLOWED.as_u16(),
                    "static assets are read-only",
                );
                return Ok(());
            }

            let Some(file) = self.files.resolve(relative) else {
                ctx.render_error(StatusCode::NOT_FOUND.as_u16(), "invalid static path");
                return Ok(());
            };

            match tokio::fs::read(&file).await {
                Ok(contents) => {
                    tracing::debug!(
                        file = %file.display(),
                        bytes = contents.len(),
                        "Serving static file"
                    );
                    let content_type = content_type_for(&file);
                    ctx.set_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
                    ctx.write_header(StatusCode::OK);
                    if method == Method::GET {
                        ctx.write(&contents);
                    }
                }
                Err(e) if is_missing(&e) => {
                    ctx.render_error(StatusCode::NOT_FOUND.as_u16(), e);
                }
                Err(e) => {
                    tracing::warn!(
                        file = %file.display(),
                        error = %e,
                        "Failed to read static file"
                    );
                    return Err(HandlerError::Io(e));
                }
            }
            Ok(())
        })
    }
}

fn is_missing(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::NotFound | ErrorKind::IsADirectory | ErrorKind::NotADirectory
    )
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
