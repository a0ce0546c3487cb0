//! Search request and response models.

use serde::{Deserialize, Serialize};

use crate::sources::SourceError;

/// Largest year the eight-digit upstream date formats can express
pub const MAX_YEAR: u32 = 9999;

/// Field a query is matched against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    #[default]
    All,
    Title,
    Author,
    Abstract,
    Category,
}

/// Sort field for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

/// Sort order for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

fn default_max_results() -> usize {
    10
}

/// Source-independent search request accepted by every adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Free-text query
    #[serde(default)]
    pub query: String,

    /// Maximum number of results to return
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Field the query is matched against
    #[serde(default)]
    pub search_field: SearchField,

    /// Sort by field
    #[serde(default)]
    pub sort_by: SortBy,

    /// Sort order
    #[serde(default)]
    pub sort_order: SortOrder,

    /// First publication year to include
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_start: Option<u32>,

    /// Last publication year to include
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_end: Option<u32>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: default_max_results(),
            search_field: SearchField::default(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            year_start: None,
            year_end: None,
        }
    }
}

impl SearchRequest {
    /// Create a new search request
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set the searched field
    pub fn search_field(mut self, field: SearchField) -> Self {
        self.search_field = field;
        self
    }

    /// Set sort by
    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = sort;
        self
    }

    /// Set sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Set the first year to include
    pub fn year_start(mut self, year: u32) -> Self {
        self.year_start = Some(year);
        self
    }

    /// Set the last year to include
    pub fn year_end(mut self, year: u32) -> Self {
        self.year_end = Some(year);
        self
    }

    /// Whether either year bound is set
    pub fn has_year_bounds(&self) -> bool {
        self.year_start.is_some() || self.year_end.is_some()
    }

    /// Reject requests that cannot be translated into a meaningful upstream query.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.query.trim().is_empty() {
            return Err(SourceError::InvalidRequest(
                "query must not be empty".to_string(),
            ));
        }

        if self.max_results == 0 {
            return Err(SourceError::InvalidRequest(
                "maxResults must be a positive integer".to_string(),
            ));
        }

        for year in [self.year_start, self.year_end].into_iter().flatten() {
            if year > MAX_YEAR {
                return Err(SourceError::InvalidRequest(format!(
                    "year {} is out of range (0-{})",
                    year, MAX_YEAR
                )));
            }
        }

        if let (Some(start), Some(end)) = (self.year_start, self.year_end) {
            if start > end {
                return Err(SourceError::InvalidRequest(format!(
                    "yearStart ({}) is after yearEnd ({})",
                    start, end
                )));
            }
        }

        Ok(())
    }
}

/// Search envelope shared by every source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<P> {
    /// Papers found
    pub papers: Vec<P>,

    /// Total number of matches reported by the source (may exceed `papers.len()`)
    pub total_results: usize,

    /// Hint that another page may exist; not a resumable token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<P> SearchResponse<P> {
    /// Create a new search response
    pub fn new(papers: Vec<P>, total_results: usize) -> Self {
        Self {
            papers,
            total_results,
            next_cursor: None,
        }
    }

    /// Response with no papers and a zero total
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Set the continuation hint
    pub fn next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults_from_json() {
        let request: SearchRequest = serde_json::from_value(json!({ "query": "crispr" })).unwrap();

        assert_eq!(request.query, "crispr");
        assert_eq!(request.max_results, 10);
        assert_eq!(request.search_field, SearchField::All);
        assert_eq!(request.sort_by, SortBy::Relevance);
        assert_eq!(request.sort_order, SortOrder::Descending);
        assert_eq!(request.year_start, None);
        assert_eq!(request.year_end, None);
    }

    #[test]
    fn test_request_camel_case_fields() {
        let request: SearchRequest = serde_json::from_value(json!({
            "query": "quantum computing",
            "maxResults": 2,
            "searchField": "title",
            "sortBy": "submittedDate",
            "sortOrder": "ascending",
            "yearStart": 2019,
            "yearEnd": 2021
        }))
        .unwrap();

        assert_eq!(
            request,
            SearchRequest::new("quantum computing")
                .max_results(2)
                .search_field(SearchField::Title)
                .sort_by(SortBy::SubmittedDate)
                .sort_order(SortOrder::Ascending)
                .year_start(2019)
                .year_end(2021)
        );
    }

    #[test]
    fn test_unknown_search_field_is_rejected() {
        let result: Result<SearchRequest, _> =
            serde_json::from_value(json!({ "query": "x", "searchField": "journal" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        assert!(SearchRequest::new("graph neural networks").validate().is_ok());
        assert!(SearchRequest::new("x").year_start(2020).year_end(2020).validate().is_ok());

        assert!(SearchRequest::new("").validate().is_err());
        assert!(SearchRequest::new("   ").validate().is_err());
        assert!(SearchRequest::new("x").max_results(0).validate().is_err());
        assert!(SearchRequest::new("x").year_start(2021).year_end(2020).validate().is_err());
        assert!(SearchRequest::new("x").year_end(10000).validate().is_err());
    }

    #[test]
    fn test_response_serialization() {
        let response: SearchResponse<String> = SearchResponse::new(vec!["a".to_string()], 7);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "papers": ["a"], "totalResults": 7 })
        );

        let response = response.next_cursor("1");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "papers": ["a"], "totalResults": 7, "nextCursor": "1" })
        );
    }
}
