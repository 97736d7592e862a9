//! Per-request context.
//!
//! # Lifecycle
//! ```text
//! Created    (built by the server, params filled from the query string)
//!     → InFlight   (passing through middleware and the route handler;
//!                   body fields and route bindings merged into params)
//!     → Finalized  (status committed; headers frozen, body appends only)
//! ```
//!
//! # Design Decisions
//! - One context per request, owned by the connection task, never shared
//! - Rendering helpers are thin delegations; a serialization failure is
//!   answered with a 500 through `render_error` and never retried

pub mod params;
pub mod render;

use std::fmt::Display;
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::Response;
use cookie::Cookie;
use serde::Serialize;

use crate::http::request::RequestParts;
use crate::http::response::ResponseSink;

pub use params::{ParamError, Params};
pub use render::{RenderError, TemplateLoadError, Templates};

/// Where a context is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Created,
    InFlight,
    Finalized,
}

/// Carrier of parameters, the inbound request and the outbound response.
#[derive(Debug)]
pub struct Context {
    params: Params,
    request: RequestParts,
    response: ResponseSink,
    templates: Arc<Templates>,
    in_flight: bool,
}

impl Context {
    /// Create a context for an inbound request, seeding params from its query.
    pub fn new(request: RequestParts, templates: Arc<Templates>) -> Self {
        let params = request.query().map(Params::from_query).unwrap_or_default();
        Self {
            params,
            request,
            response: ResponseSink::new(),
            templates,
            in_flight: false,
        }
    }

    /// Mark the context as entering the middleware chain.
    pub fn begin(&mut self) {
        self.in_flight = true;
    }

    pub fn state(&self) -> ContextState {
        if self.response.is_committed() {
            ContextState::Finalized
        } else if self.in_flight {
            ContextState::InFlight
        } else {
            ContextState::Created
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn request(&self) -> &RequestParts {
        &self.request
    }

    pub fn response(&self) -> &ResponseSink {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseSink {
        &mut self.response
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.response.write(bytes);
    }

    pub fn write_str(&mut self, text: &str) {
        self.response.write(text.as_bytes());
    }

    pub fn write_header(&mut self, status: StatusCode) -> bool {
        self.response.write_header(status)
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> bool {
        self.response.set_header(name, value)
    }

    /// Add a `Set-Cookie` header.
    pub fn set_cookie(&mut self, cookie: Cookie<'_>) -> bool {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => self.response.append_header(header::SET_COOKIE, value),
            Err(e) => {
                tracing::warn!(
                    cookie = cookie.name(),
                    error = %e,
                    "Cookie is not a valid header value"
                );
                false
            }
        }
    }

    /// Permanent redirect to `url`.
    pub fn redirect(&mut self, url: &str) {
        if self.response.is_committed() {
            tracing::warn!(
                path = %self.path(),
                location = url,
                "Redirect after response commit ignored"
            );
            return;
        }
        match HeaderValue::from_str(url) {
            Ok(location) => {
                self.response.set_header(header::LOCATION, location);
                self.response.write_header(StatusCode::MOVED_PERMANENTLY);
            }
            Err(e) => self.render_error(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), e),
        }
    }

    pub fn render_json<T: Serialize + ?Sized>(&mut self, value: &T) {
        match render::to_json(value) {
            Ok(body) => self.write_body(StatusCode::OK, "application/json; charset=utf-8", &body),
            Err(e) => self.render_error(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), e),
        }
    }

    pub fn render_xml<T: Serialize + ?Sized>(&mut self, value: &T) {
        match render::to_xml(value) {
            Ok(body) => self.write_body(
                StatusCode::OK,
                "application/xml; charset=utf-8",
                body.as_bytes(),
            ),
            Err(e) => self.render_error(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), e),
        }
    }

    /// Render a template loaded at startup, by its name relative to the template root.
    pub fn render_template<S: Serialize>(&mut self, name: &str, value: S) {
        match self.templates.render(name, value) {
            Ok(body) => {
                self.write_body(StatusCode::OK, "text/html; charset=utf-8", body.as_bytes())
            }
            Err(e) => self.render_error(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), e),
        }
    }

    /// Answer with `code` and its canonical reason as a plain-text body.
    ///
    /// Codes outside 100..=599 fall back to 500. Ignored once the response is
    /// committed so that already-written output stays intact.
    pub fn render_error(&mut self, code: u16, err: impl Display) {
        let status = match code {
            100..=599 => StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(path = %self.path(), status = %status, error = %err, "Request failed");
        } else {
            tracing::debug!(
                path = %self.path(),
                status = %status,
                error = %err,
                "Request rejected"
            );
        }

        if self.response.is_committed() {
            tracing::warn!(
                path = %self.path(),
                status = %status,
                "Error after response commit ignored"
            );
            return;
        }

        let text = format!("{}\n", status.canonical_reason().unwrap_or("Error"));
        self.response.set_header(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        self.write_body(status, "text/plain; charset=utf-8", text.as_bytes());
    }

    fn write_body(&mut self, status: StatusCode, content_type: &'static str, body: &[u8]) {
        self.response
            .set_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.response.write_header(status);
        self.response.write(body);
    }

    /// Drop buffered output so a fault response can replace it.
    pub(crate) fn discard_response(&mut self) {
        self.response.discard();
    }

    pub fn into_response(self) -> Response {
        self.response.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;

    fn context(uri: &str) -> Context {
        let request: RequestParts = Request::builder().uri(uri).body(Bytes::new()).unwrap().into();
        Context::new(request, Arc::new(Templates::new()))
    }

    #[derive(Serialize)]
    struct User {
        id: String,
    }

    #[test]
    fn test_lifecycle_states() {
        let mut ctx = context("/");
        assert_eq!(ctx.state(), ContextState::Created);
        ctx.begin();
        assert_eq!(ctx.state(), ContextState::InFlight);
        ctx.write_str("done");
        assert_eq!(ctx.state(), ContextState::Finalized);
    }

    #[test]
    fn test_query_seeds_params() {
        let ctx = context("/search?q=rust&page=2");
        assert_eq!(ctx.params().get("q"), Some("rust"));
        assert_eq!(ctx.params().parse::<u32>("page"), Ok(2));
    }

    #[test]
    fn test_render_json() {
        let mut ctx = context("/users/1");
        ctx.render_json(&User { id: "1".into() });
        let resp = ctx.response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(resp.body(), b"{\"id\":\"1\"}\n");
    }

    #[test]
    fn test_render_xml() {
        let mut ctx = context("/users/1");
        ctx.render_xml(&User { id: "1".into() });
        assert_eq!(ctx.response().body(), b"<User><id>1</id></User>");
    }

    #[test]
    fn test_missing_template_renders_500() {
        let mut ctx = context("/");
        ctx.render_template("missing.html", ());
        assert_eq!(ctx.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.response().body(), b"Internal Server Error\n");
    }

    #[test]
    fn test_render_error_code_fallback() {
        let mut ctx = context("/");
        ctx.render_error(0, "bad code");
        assert_eq!(ctx.response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let mut ctx = context("/");
        ctx.render_error(404, "gone");
        assert_eq!(ctx.response().status(), StatusCode::NOT_FOUND);
        assert_eq!(ctx.response().body(), b"Not Found\n");
    }

    #[test]
    fn test_error_after_commit_keeps_output() {
        let mut ctx = context("/");
        ctx.write_str("partial");
        ctx.render_error(500, "late failure");
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert_eq!(ctx.response().body(), b"partial");
    }

    #[test]
    fn test_redirect() {
        let mut ctx = context("/private");
        ctx.redirect("/login");
        assert_eq!(ctx.response().status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(ctx.response().headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[test]
    fn test_set_cookie() {
        let mut ctx = context("/login");
        ctx.set_cookie(Cookie::build(("X_AUTH", "token")).path("/").build());
        assert_eq!(
            ctx.response().headers().get(header::SET_COOKIE).unwrap(),
            "X_AUTH=token; Path=/"
        );
    }
}
