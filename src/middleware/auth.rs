//! Session authentication gate.
//!
//! Requests whose path starts with an allow-listed prefix pass through.
//! Everything else needs a session cookie holding a valid signature of the
//! configured message; without one the request is redirected to the login
//! page and the rest of the chain is skipped.

use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;

use crate::config::AuthConfig;
use crate::context::Context;
use crate::handler::{BoxedHandler, Handler, HandlerResult};
use crate::middleware::Middleware;
use crate::observability::metrics;
use crate::security::session::Signer;

/// Settings shared by every wrapped handler.
#[derive(Debug)]
struct AuthSettings {
    signer: Signer,
    cookie_name: String,
    message: String,
    login_path: String,
    allow_list: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Auth {
    settings: Arc<AuthSettings>,
}

impl Auth {
    pub fn new(
        signer: Signer,
        cookie_name: impl Into<String>,
        message: impl Into<String>,
        login_path: impl Into<String>,
        allow_list: Vec<String>,
    ) -> Self {
        Self {
            settings: Arc::new(AuthSettings {
                signer,
                cookie_name: cookie_name.into(),
                message: message.into(),
                login_path: login_path.into(),
                allow_list,
            }),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            Signer::new(&config.secret),
            config.cookie_name.clone(),
            config.message.clone(),
            config.login_path.clone(),
            config.allow_list.clone(),
        )
    }
}

impl Middleware for Auth {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AuthHandler {
            settings: self.settings.clone(),
            next,
        })
    }
}

struct AuthHandler {
    settings: Arc<AuthSettings>,
    next: BoxedHandler,
}

impl Handler for AuthHandler {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let settings = &self.settings;
            if settings
                .allow_list
                .iter()
                .any(|prefix| ctx.path().starts_with(prefix.as_str()))
            {
                return self.next.call(ctx).await;
            }

            let token = match ctx.request().cookie(&settings.cookie_name) {
                Ok(token) => token,
                Err(e) => {
                    ctx.render_error(StatusCode::BAD_REQUEST.as_u16(), e);
                    return Ok(());
                }
            };

            match token {
                Some(token) if settings.signer.verify(&settings.message, &token) => {
                    self.next.call(ctx).await
                }
                Some(_) => {
                    tracing::info!(
                        path = %ctx.path(),
                        "Invalid session token, redirecting to login"
                    );
                    metrics::record_auth_redirect();
                    ctx.redirect(&settings.login_path);
                    Ok(())
                }
                None => {
                    tracing::debug!(path = %ctx.path(), "No session cookie, redirecting to login");
                    metrics::record_auth_redirect();
                    ctx.redirect(&settings.login_path);
                    Ok(())
                }
            }
        })
    }
}
