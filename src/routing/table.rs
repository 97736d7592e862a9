//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store handlers per method and pattern, in registration order
//! - Look up the matching route for a method and path
//! - Act as the innermost handler of the middleware chain
//!
//! # Design Decisions
//! - Built during startup, then moved behind `Arc` (lock-free reads)
//! - Re-registering a (method, pattern) pair replaces the handler in place
//! - The most specific matching pattern wins; equally specific patterns
//!   fall back to registration order
//! - Explicit NotFound (`None`) rather than a silent default

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler, HandlerResult};
use crate::observability::metrics;
use crate::routing::pattern::{PatternError, RoutePattern};

/// A registered route.
struct Route {
    pattern: RoutePattern,
    handler: BoxedHandler,
}

/// Result of a successful lookup.
pub struct RouteMatch<'a> {
    pub pattern: &'a RoutePattern,
    pub handler: &'a BoxedHandler,
    pub bindings: Vec<(String, String)>,
}

impl std::fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern.as_str())
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Method → ordered routes.
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<Method, Vec<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Only valid before serving begins.
    pub fn register<H: Handler>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<(), PatternError> {
        let pattern = RoutePattern::parse(pattern)?;
        let handler: BoxedHandler = Arc::new(handler);
        let routes = self.routes.entry(method.clone()).or_default();

        match routes.iter_mut().find(|r| r.pattern.as_str() == pattern.as_str()) {
            Some(existing) => {
                tracing::debug!(method = %method, pattern = %pattern, "Replacing route handler");
                existing.handler = handler;
            }
            None => {
                tracing::debug!(method = %method, pattern = %pattern, "Route registered");
                routes.push(Route { pattern, handler });
            }
        }
        Ok(())
    }

    /// Find the route for `method` and `path`. `None` means NotFound.
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let mut best: Option<RouteMatch<'_>> = None;

        for route in self.routes.get(method)? {
            let Some(bindings) = route.pattern.matches(path) else {
                continue;
            };
            let better = match &best {
                Some(current) => route.pattern.specificity_cmp(current.pattern).is_gt(),
                None => true,
            };
            if better {
                best = Some(RouteMatch {
                    pattern: &route.pattern,
                    handler: &route.handler,
                    bindings,
                });
            }
        }
        best
    }

    /// Registered `(method, pattern)` pairs, sorted for stable output.
    pub fn routes(&self) -> Vec<(Method, String)> {
        let mut all: Vec<(Method, String)> = self
            .routes
            .iter()
            .flat_map(|(m, rs)| rs.iter().map(move |r| (m.clone(), r.pattern.to_string())))
            .collect();
        all.sort_by(|a, b| (a.0.as_str(), &a.1).cmp(&(b.0.as_str(), &b.1)));
        all
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze the table into the terminal handler of a middleware chain.
    pub fn into_handler(self) -> Dispatch {
        Dispatch {
            table: Arc::new(self),
        }
    }
}

/// Terminal handler: match the route, bind parameters, run the handler.
#[derive(Clone)]
pub struct Dispatch {
    table: Arc<RouteTable>,
}

impl Dispatch {
    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

impl Handler for Dispatch {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let found = self.table.match_route(ctx.method(), ctx.path());
            let Some(RouteMatch {
                pattern,
                handler,
                bindings,
            }) = found
            else {
                tracing::debug!(method = %ctx.method(), path = %ctx.path(), "No route matched");
                metrics::record_not_found();
                ctx.render_error(StatusCode::NOT_FOUND.as_u16(), "no matching route");
                return Ok(());
            };

            tracing::trace!(pattern = %pattern, bindings = ?bindings, "Route matched");
            ctx.params_mut().extend(bindings);
            handler.call(ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Templates;
    use crate::handler::handler_fn;
    use axum::body::Bytes;
    use axum::http::Request;

    fn named(name: &'static str) -> impl Handler {
        handler_fn(move |ctx| {
            Box::pin(async move {
                ctx.write_str(name);
                Ok(())
            })
        })
    }

    fn context(method: Method, uri: &str) -> Context {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap();
        Context::new(request.into(), Arc::new(Templates::new()))
    }

    #[test]
    fn test_literal_match_has_no_bindings() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/about", named("about")).unwrap();

        let m = table.match_route(&Method::GET, "/about").unwrap();
        assert_eq!(m.pattern.as_str(), "/about");
        assert!(m.bindings.is_empty());
    }

    #[test]
    fn test_param_bindings() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/users/:id", named("user")).unwrap();
        table
            .register(
                Method::GET,
                "/users/:user_id/addresses/:address_id",
                named("address"),
            )
            .unwrap();

        let m = table.match_route(&Method::GET, "/users/42").unwrap();
        assert_eq!(m.bindings, vec![("id".to_string(), "42".to_string())]);

        let m = table.match_route(&Method::GET, "/users/7/addresses/3").unwrap();
        assert_eq!(
            m.bindings,
            vec![
                ("user_id".to_string(), "7".to_string()),
                ("address_id".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_not_found() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/users/:id", named("user")).unwrap();

        assert!(table.match_route(&Method::GET, "/nope").is_none());
        assert!(table.match_route(&Method::GET, "/users/1/extra").is_none());
        assert!(table.match_route(&Method::POST, "/users/1").is_none());
        assert!(RouteTable::new().match_route(&Method::GET, "/").is_none());
    }

    #[test]
    fn test_literal_preferred_over_param_regardless_of_order() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/users/:id", named("param")).unwrap();
        table.register(Method::GET, "/users/new", named("literal")).unwrap();

        assert_eq!(
            table.match_route(&Method::GET, "/users/new").unwrap().pattern.as_str(),
            "/users/new"
        );
        assert_eq!(
            table.match_route(&Method::GET, "/users/5").unwrap().pattern.as_str(),
            "/users/:id"
        );
    }

    #[test]
    fn test_equal_specificity_first_registered_wins() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/files/:name", named("first")).unwrap();
        table.register(Method::GET, "/files/:id", named("second")).unwrap();

        let m = table.match_route(&Method::GET, "/files/a").unwrap();
        assert_eq!(m.pattern.as_str(), "/files/:name");
    }

    #[tokio::test]
    async fn test_reregistration_overwrites() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/about", named("old")).unwrap();
        table.register(Method::GET, "/about", named("new")).unwrap();
        assert_eq!(table.len(), 1);

        let dispatch = table.into_handler();
        let mut ctx = context(Method::GET, "/about");
        dispatch.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().body(), b"new");
    }

    #[tokio::test]
    async fn test_dispatch_binds_params_over_query() {
        let mut table = RouteTable::new();
        table
            .register(
                Method::GET,
                "/users/:id",
                handler_fn(|ctx| {
                    Box::pin(async move {
                        let id = ctx.params().require("id")?.to_string();
                        let extra = ctx.params().get("extra").unwrap_or("-").to_string();
                        ctx.write_str(&format!("{}:{}", id, extra));
                        Ok(())
                    })
                }),
            )
            .unwrap();

        let dispatch = table.into_handler();
        let mut ctx = context(Method::GET, "/users/42?id=query&extra=x");
        dispatch.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().body(), b"42:x");
    }

    #[tokio::test]
    async fn test_dispatch_decodes_path_like_query() {
        let mut table = RouteTable::new();
        table
            .register(
                Method::GET,
                "/users/:name",
                handler_fn(|ctx| {
                    Box::pin(async move {
                        let name = ctx.params().require("name")?.to_string();
                        let q = ctx.params().require("q")?.to_string();
                        ctx.write_str(&format!("{}|{}", name, q));
                        Ok(())
                    })
                }),
            )
            .unwrap();
        table.register(Method::GET, "/café", named("cafe")).unwrap();

        let dispatch = table.into_handler();
        let mut ctx = context(Method::GET, "/users/John%20Doe?q=John%20Doe");
        dispatch.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().body(), b"John Doe|John Doe");

        let mut ctx = context(Method::GET, "/caf%C3%A9");
        dispatch.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().body(), b"cafe");

        let mut ctx = context(Method::GET, "/users/%FF");
        dispatch.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dispatch_not_found_is_404_not_fault() {
        let dispatch = RouteTable::new().into_handler();
        let mut ctx = context(Method::GET, "/nope");
        assert!(dispatch.call(&mut ctx).await.is_ok());
        assert_eq!(ctx.response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_routes_listing() {
        let mut table = RouteTable::new();
        table.register(Method::POST, "/users", named("create")).unwrap();
        table.register(Method::GET, "/users/:id", named("show")).unwrap();
        assert_eq!(
            table.routes(),
            vec![
                (Method::GET, "/users/:id".to_string()),
                (Method::POST, "/users".to_string()),
            ]
        );
    }
}
