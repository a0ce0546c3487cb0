//! Core data models for search requests and normalized papers.

mod paper;
mod search;

pub use paper::{ArxivPaper, PubMedPaper};
pub use search::{SearchField, SearchRequest, SearchResponse, SortBy, SortOrder, MAX_YEAR};
