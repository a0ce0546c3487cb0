//! arXiv research source implementation.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

use crate::config::ArxivConfig;
use crate::models::{ArxivPaper, SearchField, SearchRequest, SearchResponse, SortBy, SortOrder};
use crate::sources::{Source, SourceError};
use crate::utils::{HttpClient, SourceRateLimiter, XmlElement};

/// Lower bound used when only `yearEnd` is given
const OPEN_START_DATE: &str = "00000101";
/// Upper bound used when only `yearStart` is given
const OPEN_END_DATE: &str = "99991231";

/// arXiv research source
///
/// Issues a single call against the Atom query API and normalizes the
/// returned feed.
#[derive(Debug)]
pub struct ArxivSource {
    client: HttpClient,
    endpoint: Url,
    limiter: SourceRateLimiter,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new(client: HttpClient, config: &ArxivConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client,
            endpoint: Url::parse(&config.base_url)?,
            limiter: SourceRateLimiter::new("arxiv", config.rate_limit()),
        })
    }

    /// Build the `search_query` value for the arXiv API
    ///
    /// `ti:quantum computing`, or with year bounds
    /// `(ti:quantum computing) AND (submittedDate:[20200101 TO 99991231])`.
    pub fn build_search_query(request: &SearchRequest) -> String {
        let prefix = match request.search_field {
            SearchField::All => "all",
            SearchField::Title => "ti",
            SearchField::Author => "au",
            SearchField::Abstract => "abs",
            SearchField::Category => "cat",
        };
        let field_query = format!("{}:{}", prefix, request.query);

        if !request.has_year_bounds() {
            return field_query;
        }

        let start = request
            .year_start
            .map_or_else(|| OPEN_START_DATE.to_string(), |y| format!("{:04}0101", y));
        let end = request
            .year_end
            .map_or_else(|| OPEN_END_DATE.to_string(), |y| format!("{:04}1231", y));

        format!("({}) AND (submittedDate:[{} TO {}])", field_query, start, end)
    }

    fn sort_params(request: &SearchRequest) -> (&'static str, &'static str) {
        let sort_by = match request.sort_by {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        };
        let sort_order = match request.sort_order {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        };
        (sort_by, sort_order)
    }

    /// Normalize an Atom feed into papers plus totals.
    ///
    /// `nextCursor` is set to `max_results` only when the page came back full.
    pub fn parse_feed(
        xml: &str,
        max_results: usize,
    ) -> Result<SearchResponse<ArxivPaper>, SourceError> {
        let feed = XmlElement::parse(xml)?;
        if feed.name() != "feed" {
            return Err(SourceError::Parse(format!(
                "expected Atom <feed>, found <{}>",
                feed.name()
            )));
        }

        let total_results = feed
            .child_text("totalResults")
            .ok_or_else(|| SourceError::Parse("feed has no totalResults".to_string()))?
            .parse::<usize>()
            .map_err(|e| SourceError::Parse(format!("invalid totalResults: {}", e)))?;

        let papers = feed
            .children("entry")
            .into_iter()
            .map(Self::parse_entry)
            .collect::<Result<Vec<_>, _>>()?;

        let full_page = papers.len() == max_results;
        let response = SearchResponse::new(papers, total_results);
        Ok(if full_page {
            response.next_cursor(max_results.to_string())
        } else {
            response
        })
    }

    fn parse_entry(entry: &XmlElement) -> Result<ArxivPaper, SourceError> {
        let id = entry
            .child_text("id")
            .ok_or_else(|| SourceError::Parse("entry without id".to_string()))?;

        let authors = entry
            .children("author")
            .into_iter()
            .filter_map(|author| author.child_text("name"))
            .collect();

        let categories = entry
            .children("category")
            .into_iter()
            .filter_map(|c| c.attr("term"))
            .map(str::to_string)
            .collect();

        let pdf_url = entry
            .children("link")
            .into_iter()
            .find(|link| link.attr("title") == Some("pdf"))
            .and_then(|link| link.attr("href"))
            .map(str::to_string);

        Ok(ArxivPaper {
            id,
            title: entry.child_text("title").unwrap_or_default(),
            authors,
            summary: entry.child_text("summary").unwrap_or_default(),
            published: entry.child_text("published").unwrap_or_default(),
            updated: entry.child_text("updated"),
            categories,
            primary_category: entry
                .child("primary_category")
                .and_then(|c| c.attr("term"))
                .map(str::to_string),
            pdf_url,
            doi: entry.child_text("doi"),
            journal_ref: entry.child_text("journal_ref"),
            comment: entry.child_text("comment"),
        })
    }
}

#[async_trait]
impl Source for ArxivSource {
    type Paper = ArxivPaper;

    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn rate_limit(&self) -> Duration {
        self.limiter.interval()
    }

    fn build_query(&self, request: &SearchRequest) -> String {
        Self::build_search_query(request)
    }

    #[instrument(skip(self, request), fields(source = "arxiv", query = %request.query))]
    async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse<ArxivPaper>, SourceError> {
        request.validate()?;

        let search_query = self.build_query(request);
        let (sort_by, sort_order) = Self::sort_params(request);
        let params = [
            ("search_query", search_query),
            ("start", "0".to_string()),
            ("max_results", request.max_results.to_string()),
            ("sortBy", sort_by.to_string()),
            ("sortOrder", sort_order.to_string()),
        ];

        self.limiter.reserve_slot().await;
        let xml = self
            .client
            .get_text(&self.endpoint, &params, "arXiv API")
            .await?;

        let response = Self::parse_feed(&xml, request.max_results)?;
        info!(
            papers = response.papers.len(),
            total = response.total_results,
            "arXiv search complete"
        );
        Ok(response)
    }
}
