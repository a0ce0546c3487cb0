//! HTTP boundary for the source adapters.
//!
//! - `POST /api/arxiv` - search arXiv
//! - `POST /api/pubmed` - search PubMed
//!
//! Successful searches answer with the `{ papers, totalResults, nextCursor? }`
//! envelope; failures answer with `{ "error": { "kind", "message" } }`.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::CACHE_CONTROL_VALUE;

use axum::routing::post;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::sources::{ArxivSource, PubMedSource, SourceError};
use crate::utils::HttpClient;

/// Adapters shared by every request; each owns its rate limiter
#[derive(Debug, Clone)]
pub struct AppState {
    pub arxiv: Arc<ArxivSource>,
    pub pubmed: Arc<PubMedSource>,
}

impl AppState {
    pub fn new(arxiv: ArxivSource, pubmed: PubMedSource) -> Self {
        Self {
            arxiv: Arc::new(arxiv),
            pubmed: Arc::new(pubmed),
        }
    }

    /// Build both adapters over one shared HTTP client
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::new(&config.http)?;
        Ok(Self::new(
            ArxivSource::new(client.clone(), &config.arxiv)?,
            PubMedSource::new(client, &config.pubmed)?,
        ))
    }
}

/// Create the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/arxiv",
            post(handlers::search_arxiv).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/pubmed",
            post(handlers::search_pubmed).fallback(handlers::method_not_allowed),
        )
        .with_state(state)
}

/// Bind `address` and serve until ctrl-c
pub async fn serve(state: AppState, address: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("Gateway listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
