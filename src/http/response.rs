//! Outbound response sink.
//!
//! # Responsibilities
//! - Buffer status, headers and body written by the chain
//! - Freeze status and headers once the response is committed
//! - Convert the buffered response into an axum `Response`
//!
//! # Design Decisions
//! - Nothing reaches the wire until the chain returns, so recovery can
//!   discard a partially written body
//! - Writing the body without a status commits `200 OK`
//! - Late status/header changes are ignored, late body writes append

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;

/// Buffered response written by handlers.
#[derive(Debug, Default)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// True once a status or body byte has been written.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Set a header, replacing earlier values. Ignored after commit.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> bool {
        if self.committed {
            tracing::debug!(header = %name, "Ignoring header set after response commit");
            return false;
        }
        self.headers.insert(name, value);
        true
    }

    /// Add a header value, keeping earlier ones. Ignored after commit.
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) -> bool {
        if self.committed {
            tracing::debug!(header = %name, "Ignoring header append after response commit");
            return false;
        }
        self.headers.append(name, value);
        true
    }

    /// Commit the status line. Returns false if already committed.
    pub fn write_header(&mut self, status: StatusCode) -> bool {
        if self.committed {
            tracing::debug!(
                current = %self.status,
                ignored = %status,
                "Ignoring superfluous status write"
            );
            return false;
        }
        self.status = status;
        self.committed = true;
        true
    }

    /// Append to the body, committing `200 OK` if nothing was committed yet.
    pub fn write(&mut self, bytes: &[u8]) {
        if !self.committed {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(bytes);
    }

    /// Drop everything written so far.
    pub(crate) fn discard(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
        self.committed = false;
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_body_write_commits_ok() {
        let mut sink = ResponseSink::new();
        assert!(!sink.is_committed());
        sink.write(b"hello");
        assert!(sink.is_committed());
        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(sink.body(), b"hello");
    }

    #[test]
    fn test_status_frozen_after_commit() {
        let mut sink = ResponseSink::new();
        assert!(sink.write_header(StatusCode::CREATED));
        assert!(!sink.write_header(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!sink.set_header(header::LOCATION, HeaderValue::from_static("/x")));
        sink.write(b"a");
        sink.write(b"b");
        assert_eq!(sink.status(), StatusCode::CREATED);
        assert!(sink.headers().get(header::LOCATION).is_none());
        assert_eq!(sink.body(), b"ab");
    }

    #[test]
    fn test_discard_resets() {
        let mut sink = ResponseSink::new();
        sink.write(b"partial");
        sink.discard();
        assert!(!sink.is_committed());
        assert!(sink.body().is_empty());
        assert!(sink.write_header(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
