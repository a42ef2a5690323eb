//! Sangha API Server Entry Point
//!
//! Bootstraps configuration and the in-memory directory store, then starts
//! the Axum HTTP server.

use std::net::SocketAddr;

use axum::Router;
use sangha_api::{create_api_router, ApiError, ApiResult, AppState, IdentityState};
use sangha_core::AuthzConfig;
use sangha_store::MemoryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AuthzConfig::from_env();
    config
        .validate()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let store = MemoryStore::new();
    let state = AppState::new(store, config.clone());
    let identity = IdentityState::new(config);

    let app: Router = create_api_router(state, identity);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Sangha API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("SANGHA_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("SANGHA_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
