//! Body parsing middleware.
//!
//! Eagerly merges the request body into the context params before the rest
//! of the chain runs:
//! - `application/x-www-form-urlencoded`: every field, first value wins
//! - `application/json`: top-level fields of an object; strings verbatim,
//!   other values as compact JSON text
//!
//! Body fields overwrite query parameters of the same name. A malformed body
//! is returned as `HandlerError::BodyParse` for the recovery middleware.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler, HandlerResult};
use crate::middleware::Middleware;

const FORM: &str = "application/x-www-form-urlencoded";
const JSON: &str = "application/json";

/// Failure decoding a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON body must be an object, got {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BodyParser;

impl Middleware for BodyParser {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(BodyParserHandler { next })
    }
}

struct BodyParserHandler {
    next: BoxedHandler,
}

impl Handler for BodyParserHandler {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let fields = parse_body(ctx)?;
            if !fields.is_empty() {
                tracing::trace!(count = fields.len(), "Merged body fields into params");
                ctx.params_mut().extend(fields);
            }
            self.next.call(ctx).await
        })
    }
}

fn parse_body(ctx: &Context) -> Result<Vec<(String, String)>, BodyError> {
    let request = ctx.request();
    if request.body().is_empty() {
        return Ok(Vec::new());
    }

    match request.content_type() {
        Some(ct) if ct.eq_ignore_ascii_case(FORM) => Ok(parse_form(request.body())),
        Some(ct) if ct.eq_ignore_ascii_case(JSON) => parse_json(request.body()),
        _ => Ok(Vec::new()),
    }
}

fn parse_form(body: &[u8]) -> Vec<(String, String)> {
    let mut fields = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        fields
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    fields.into_iter().collect()
}

fn parse_json(body: &[u8]) -> Result<Vec<(String, String)>, BodyError> {
    let value: Value = serde_json::from_slice(body)?;
    let Value::Object(map) = value else {
        return Err(BodyError::NotAnObject(json_kind(&value)));
    };

    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
