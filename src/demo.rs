//! Demo application served by the `onion-dispatch` binary.
//!
//! A login page that issues a signed session cookie, an index page, and a
//! small users API exercising route bindings, JSON and XML rendering and
//! body parsing. Everything except `/login` and `/public/` sits behind the
//! auth gate when `auth.enabled` is set.

use std::sync::Arc;

use cookie::Cookie;
use minijinja::context;
use serde::Serialize;

use crate::config::AuthConfig;
use crate::handler::handler_fn;
use crate::http::Server;
use crate::middleware::Auth;
use crate::routing::PatternError;
use crate::security::Signer;

const LOGIN_TEMPLATE: &str = "login.html";
const INDEX_TEMPLATE: &str = "index.html";

#[derive(Debug, Serialize)]
pub struct User {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<String>,
}

/// Credentials and cookie settings used by the login handlers.
struct LoginSettings {
    signer: Signer,
    cookie_name: String,
    message: String,
    username: String,
    password: String,
}

impl LoginSettings {
    fn from_config(config: &AuthConfig) -> Self {
        Self {
            signer: Signer::new(&config.secret),
            cookie_name: config.cookie_name.clone(),
            message: config.message.clone(),
            username: config.demo_username.clone(),
            password: config.demo_password.clone(),
        }
    }

    fn check(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

/// Register the demo routes, then append the auth gate if enabled.
pub fn register(server: &mut Server) -> Result<(), PatternError> {
    let auth = server.config().auth.clone();
    let login = Arc::new(LoginSettings::from_config(&auth));

    server.get(
        "/login",
        handler_fn(|ctx| {
            Box::pin(async move {
                ctx.render_template(LOGIN_TEMPLATE, context! { message => "Please log in" });
                Ok(())
            })
        }),
    )?;

    server.post(
        "/login",
        handler_fn(move |ctx| {
            let login = login.clone();
            Box::pin(async move {
                let username = ctx.params().get("username").unwrap_or_default().to_string();
                let password = ctx.params().get("password").unwrap_or_default().to_string();

                if login.check(&username, &password) {
                    tracing::info!(username = %username, "Login succeeded");
                    let token = login.signer.sign(&login.message);
                    ctx.set_cookie(
                        Cookie::build((login.cookie_name.clone(), token))
                            .path("/")
                            .http_only(true)
                            .build(),
                    );
                    ctx.redirect("/");
                    return Ok(());
                }

                tracing::info!(username = %username, "Login rejected");
                ctx.render_template(
                    LOGIN_TEMPLATE,
                    context! { message => "Username or password is incorrect" },
                );
                Ok(())
            })
        }),
    )?;

    server.get(
        "/",
        handler_fn(|ctx| {
            Box::pin(async move {
                let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                ctx.render_template(INDEX_TEMPLATE, context! { time => now });
                ctx.write_str("welcome!\n");
                Ok(())
            })
        }),
    )?;

    server.get(
        "/about",
        handler_fn(|ctx| {
            Box::pin(async move {
                ctx.write_str("about!\n");
                Ok(())
            })
        }),
    )?;

    server.get(
        "/users/:id",
        handler_fn(|ctx| {
            Box::pin(async move {
                let id = ctx.params().require("id")?.to_string();
                // Kept as a way to see the recovery middleware at work.
                if id == "0" {
                    panic!("id is zero");
                }
                ctx.render_json(&User {
                    id,
                    address_id: None,
                });
                Ok(())
            })
        }),
    )?;

    server.get(
        "/users/:id/xml",
        handler_fn(|ctx| {
            Box::pin(async move {
                let id = ctx.params().require("id")?.to_string();
                ctx.render_xml(&User {
                    id,
                    address_id: None,
                });
                Ok(())
            })
        }),
    )?;

    server.get(
        "/users/:user_id/addresses/:address_id",
        handler_fn(|ctx| {
            Box::pin(async move {
                let user = User {
                    id: ctx.params().require("user_id")?.to_string(),
                    address_id: Some(ctx.params().require("address_id")?.to_string()),
                };
                ctx.render_json(&user);
                Ok(())
            })
        }),
    )?;

    server.post(
        "/users",
        handler_fn(|ctx| {
            Box::pin(async move {
                ctx.write_str("create user\n");
                Ok(())
            })
        }),
    )?;

    server.post(
        "/users/:user_id/addresses",
        handler_fn(|ctx| {
            Box::pin(async move {
                let user_id = ctx.params().require("user_id")?.to_string();
                ctx.write_str(&format!("create user {}'s address\n", user_id));
                Ok(())
            })
        }),
    )?;

    if auth.enabled {
        server.use_middleware(Auth::from_config(&auth));
    }
    Ok(())
}
