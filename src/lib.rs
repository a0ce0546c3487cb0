//! # Paper Gateway
//!
//! One uniform search request, normalized bibliographic results from arXiv
//! and PubMed.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Search request, response envelope and per-source paper records
//! - [`sources`]: Source adapters (query translation, rate-limited fetch, XML normalization)
//! - [`gateway`]: axum routes and the error envelope
//! - [`utils`]: HTTP client, rate limiter and XML element tree
//! - [`config`]: Configuration management

pub mod config;
pub mod gateway;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{SearchRequest, SearchResponse};
pub use sources::{ArxivSource, PubMedSource, Source, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
