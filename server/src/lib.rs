//! HTTP host for the mastery block.
//!
//! The host runtime owns the HTTP boundary; this crate only decodes the body
//! and hands it to the core grade handler. Whatever the verdict, the
//! response is `200 null`, so a forged report cannot learn why it failed.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use masterygate_core::{BlockConfig, ConfigError, GradeHandler, GradePublisher, RejectReason};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Names a JSON file holding the block config; falls back to `MASTERY_*` variables when unset.
pub const ENV_BLOCK_CONFIG: &str = "MASTERY_BLOCK_CONFIG";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

impl ServerConfig {
    /// Load from `HOST` and `PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match lookup("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidListenAddr(format!("port {p}")))?,
            None => 8080,
        };
        let listen_addr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(format!("{host}:{port}")))?;
        Ok(Self { listen_addr })
    }
}

/// Load the block config from the file named by `MASTERY_BLOCK_CONFIG`, or from the environment.
pub fn load_block_config() -> anyhow::Result<BlockConfig> {
    match std::env::var(ENV_BLOCK_CONFIG) {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)?;
            Ok(BlockConfig::from_json_str(&raw)?)
        }
        Err(_) => Ok(BlockConfig::from_env()?),
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub grades: Arc<GradeHandler>,
}

impl AppState {
    pub fn new(config: BlockConfig, publisher: Arc<dyn GradePublisher>) -> Self {
        Self { grades: Arc::new(GradeHandler::new(config, publisher)) }
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/handle_grade", post(handle_grade))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Takes the body extraction result itself so oversized or unreadable bodies
/// are declined quietly instead of being answered with a 4xx.
async fn handle_grade(State(state): State<AppState>, body: Result<Bytes, BytesRejection>) -> Json<Value> {
    match body {
        Ok(bytes) => state.grades.handle_grade_json(&bytes),
        Err(e) => state.grades.decline(RejectReason::Malformed(format!("unreadable body: {e}"))),
    };
    Json(Value::Null)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true).init();
}

/// Bind and serve until Ctrl+C.
pub async fn run(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("masterygate-server listening on {}", config.listen_addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        Err(e) => tracing::warn!(error = %e, "failed to listen for Ctrl+C"),
    }
}
