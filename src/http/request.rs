//! Inbound request view.
//!
//! # Responsibilities
//! - Hold method, URI, headers and the fully buffered body of one request
//! - Expose routing-relevant information (method, path, query)
//! - Parse cookies and the request ID header on demand
//!
//! # Design Decisions
//! - The body is read once by the server before the chain runs
//! - Malformed cookie pairs are skipped, only an unreadable header is an error

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, Request, Uri};
use cookie::Cookie;
use thiserror::Error;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Error reading the `Cookie` header.
#[derive(Debug, Error)]
pub enum CookieError {
    #[error("cookie header is not valid UTF-8")]
    NotUtf8,
}

/// The inbound half of a request context.
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestParts {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path component of the request URI, without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Media type of the body without parameters, e.g. `application/json`.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
            .map(|ct| ct.split(';').next().unwrap_or_default().trim())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    /// Look up a cookie by name across all `Cookie` headers.
    pub fn cookie(&self, name: &str) -> Result<Option<String>, CookieError> {
        for value in self.headers.get_all(header::COOKIE) {
            let raw = value.to_str().map_err(|_| CookieError::NotUtf8)?;
            for parsed in Cookie::split_parse(raw) {
                match parsed {
                    Ok(c) if c.name() == name => return Ok(Some(c.value().to_string())),
                    Ok(_) => {}
                    Err(e) => tracing::debug!(error = %e, "Skipping malformed cookie pair"),
                }
            }
        }
        Ok(None)
    }
}

impl From<Request<Bytes>> for RequestParts {
    fn from(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body)
    }
}
