//! Utility modules supporting the source adapters.
//!
//! - [`HttpClient`]: shared outbound HTTP client, single attempt per call
//! - [`SourceRateLimiter`]: per-source pacing of outbound calls
//! - [`XmlElement`]: parsed XML tree with cardinality-independent child access
//!
//! # Rate limiting
//!
//! ```rust,no_run
//! use paper_gateway::utils::SourceRateLimiter;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = SourceRateLimiter::new("arxiv", Duration::from_secs(3));
//! limiter.reserve_slot().await; // immediate
//! limiter.reserve_slot().await; // waits ~3s
//! # }
//! ```
//!
//! # XML normalization
//!
//! ```rust
//! use paper_gateway::utils::XmlElement;
//!
//! let list = XmlElement::parse("<AuthorList><Author>Ada</Author></AuthorList>").unwrap();
//! assert_eq!(list.children("Author").len(), 1);
//! ```

mod http;
mod rate_limit;
mod xml;

pub use http::{HttpClient, DEFAULT_USER_AGENT};
pub use rate_limit::SourceRateLimiter;
pub use xml::{XmlElement, XmlError};
