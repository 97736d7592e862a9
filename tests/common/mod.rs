//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpListener;

use onion_dispatch::config::ServerConfig;
use onion_dispatch::security::Signer;
use onion_dispatch::{demo, Server, Shutdown};

/// Write the demo templates and one static asset into `root`.
pub fn write_site(root: &Path) {
    std::fs::write(root.join("login.html"), "<p>{{ message }}</p>").unwrap();
    std::fs::write(root.join("index.html"), "<p>time: {{ time }}</p>\n").unwrap();
    std::fs::write(root.join("site.css"), "body { margin: 0 }").unwrap();
}

/// Default config with templates and static files served from `root`.
pub fn site_config(root: &Path, addr: SocketAddr) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = addr.to_string();
    config.static_files.root = root.display().to_string();
    config.templates.root = root.display().to_string();
    config.auth.secret = "integration-test-secret".into();
    config
}

/// A valid session cookie header for `config`.
pub fn session_cookie(config: &ServerConfig) -> String {
    let token = Signer::new(&config.auth.secret).sign(&config.auth.message);
    format!("{}={}", config.auth.cookie_name, token)
}

/// Start the demo app on `addr`. Trigger the returned handle to stop it.
pub async fn start_demo(config: ServerConfig) -> Shutdown {
    let addr = config.listener.bind_address.clone();
    let mut server = Server::new(config);
    demo::register(&mut server).unwrap();
    start(server, &addr).await
}

/// Start an already assembled server on `addr`.
pub async fn start(server: Server, addr: &str) -> Shutdown {
    let listener = TcpListener::bind(addr).await.unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();

    tokio::spawn(async move {
        if let Err(e) = server.serve(listener, receiver).await {
            eprintln!("test server failed: {}", e);
        }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown
}

/// A client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
