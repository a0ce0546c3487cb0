//! Literature source adapters.
//!
//! Every adapter runs the same pipeline for one [`SearchRequest`]:
//!
//! 1. translate the request into the source's native query grammar
//! 2. wait for the source's rate slot
//! 3. fetch the XML response(s), one attempt per call
//! 4. normalize the XML into the source's paper record
//!
//! Adapters own their [`SourceRateLimiter`](crate::utils::SourceRateLimiter),
//! so sharing one adapter instance across requests shares its pacing.

mod arxiv;
mod pubmed;

pub use arxiv::ArxivSource;
pub use pubmed::PubMedSource;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::models::{SearchRequest, SearchResponse};
use crate::utils::XmlError;

/// The Source trait defines the interface shared by the literature adapters.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Normalized record produced by this source
    type Paper: Serialize + Send + Sync + 'static;

    /// Unique identifier for this source (used in routes, e.g. "arxiv", "pubmed")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Minimum spacing between two outbound calls
    fn rate_limit(&self) -> Duration;

    /// Translate a request into the source's native query string
    fn build_query(&self, request: &SearchRequest) -> String;

    /// Run the full translate, fetch and normalize pipeline
    async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse<Self::Paper>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Response did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Adapter could not be constructed from its configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<XmlError> for SourceError {
    fn from(err: XmlError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        SourceError::Config(format!("invalid URL: {}", err))
    }
}
