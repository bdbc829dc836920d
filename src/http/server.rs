//! # HTTP Server
//!
//! Binds the API router with CORS and serves it until a shutdown signal.
//! The final durable flush happens after `serve` returns, in the CLI.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::routes::api_routes;
use crate::config::TombolaConfig;
use crate::observability::Logger;
use crate::sync::SyncContext;

/// HTTP server over a sync context.
pub struct HttpServer {
    config: TombolaConfig,
    router: Router,
}

impl HttpServer {
    /// Build the server for a context and configuration.
    pub fn new(config: TombolaConfig, ctx: Arc<SyncContext>) -> Self {
        let router = Self::build_router(&config, ctx);
        Self { config, router }
    }

    /// Build the combined router with CORS applied.
    fn build_router(config: &TombolaConfig, ctx: Arc<SyncContext>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            // No origins configured: permissive, for development
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(health))
            .nest("/api", api_routes(ctx))
            .layer(cors)
    }

    /// The router (for testing).
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until ctrl-c.
    pub async fn start(self) -> std::io::Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        Logger::info("HTTP_LISTENING", &[("addr", &addr.to_string())]);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    Logger::info("SHUTDOWN_SIGNAL", &[]);
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}
