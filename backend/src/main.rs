//! Read-only audit API over the cash-desk ledger.

mod auth;
mod config;
mod domain;
mod error;
mod rest;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use domain::audit_service::AuditService;
use rest::AppState;
use storage::SqliteLedgerStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);

    let store = SqliteLedgerStore::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open store at {}", config.database_url))?;

    let state = AppState {
        audit: Arc::new(AuditService::new(Arc::new(store), &config)),
        config: config.clone(),
    };

    let cors = if config.cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET])
            .allow_headers(Any)
    } else {
        let origin: HeaderValue = config
            .cors_origin
            .parse()
            .with_context(|| format!("invalid CORS_ORIGIN '{}'", config.cors_origin))?;
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET])
            .allow_headers(Any)
    };

    let app = rest::router(state).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, version = %config.api_version, "audit api listening");

    axum::serve(listener, app).await?;
    Ok(())
}
