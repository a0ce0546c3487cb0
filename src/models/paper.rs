//! Normalized paper records, one shape per source.
//!
//! The two sources expose different metadata, so each keeps its own record
//! type; both are wrapped in the shared [`SearchResponse`](super::SearchResponse)
//! envelope.

use serde::{Deserialize, Serialize};

/// A preprint normalized from an arXiv Atom entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArxivPaper {
    /// Entry id as published by arXiv (abstract page URL)
    pub id: String,

    /// Paper title, trimmed
    pub title: String,

    /// Author display names in feed order
    pub authors: Vec<String>,

    /// Abstract text, trimmed
    pub summary: String,

    /// First submission timestamp, as sent by arXiv
    pub published: String,

    /// Last revision timestamp, as sent by arXiv
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    /// Subject categories in feed order
    pub categories: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<String>,

    /// Link whose `title` is `pdf`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A citation normalized from a PubMed `PubmedArticle` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubMedPaper {
    /// PubMed identifier (PMID)
    pub id: String,

    /// Article title, trimmed
    pub title: String,

    /// Author display names in record order
    pub authors: Vec<String>,

    /// Abstract text, trimmed; structured sections are prefixed by their label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#abstract: Option<String>,

    /// Journal title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,

    /// Journal issue date as PubMed writes it (e.g. `2020 Mar 15`, `2019 Nov-Dec`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// PubMed record page
    pub url: String,
}

impl PubMedPaper {
    /// Record page URL for a PMID
    pub fn url_for(pmid: &str) -> String {
        format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid)
    }
}
