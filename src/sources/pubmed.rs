//! PubMed research source implementation using E-utilities API.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::PubMedConfig;
use crate::models::{PubMedPaper, SearchRequest, SearchResponse, SortBy};
use crate::sources::{Source, SourceError};
use crate::utils::{HttpClient, SourceRateLimiter, XmlElement};

/// PubMed research source
///
/// Uses NCBI E-utilities: `esearch` discovers PMIDs, `efetch` retrieves the
/// records. Each call takes its own rate slot.
#[derive(Debug)]
pub struct PubMedSource {
    client: HttpClient,
    esearch: Url,
    efetch: Url,
    api_key: Option<String>,
    limiter: SourceRateLimiter,
}

/// Outcome of the `esearch` step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdList {
    pub count: usize,
    pub ids: Vec<String>,
}

impl PubMedSource {
    /// Create a new PubMed source
    pub fn new(client: HttpClient, config: &PubMedConfig) -> Result<Self, SourceError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;

        Ok(Self {
            client,
            esearch: base.join("esearch.fcgi")?,
            efetch: base.join("efetch.fcgi")?,
            api_key: config.api_key().map(str::to_string),
            limiter: SourceRateLimiter::new("pubmed", config.rate_limit()),
        })
    }

    /// Build the `term` value for esearch
    ///
    /// A missing bound is left empty, so `yearStart` alone gives
    /// `(q) AND (2020[PDAT] : )`.
    pub fn build_search_term(request: &SearchRequest) -> String {
        if !request.has_year_bounds() {
            return request.query.clone();
        }

        let bound = |year: Option<u32>| year.map(|y| format!("{}[PDAT]", y)).unwrap_or_default();
        format!(
            "({}) AND ({} : {})",
            request.query,
            bound(request.year_start),
            bound(request.year_end)
        )
    }

    fn sort_param(request: &SearchRequest) -> &'static str {
        match request.sort_by {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate | SortBy::SubmittedDate => "pub_date",
        }
    }

    fn with_api_key(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// Parse an `eSearchResult` document
    pub fn parse_id_list(xml: &str) -> Result<IdList, SourceError> {
        let root = XmlElement::parse(xml)?;
        if root.name() != "eSearchResult" {
            return Err(SourceError::Parse(format!(
                "expected <eSearchResult>, found <{}>",
                root.name()
            )));
        }

        if let Some(message) = root.child_text("ERROR") {
            return Err(SourceError::Api(format!("PubMed esearch error: {}", message)));
        }

        let count = root
            .child_text("Count")
            .ok_or_else(|| SourceError::Parse("esearch result has no Count".to_string()))?
            .parse::<usize>()
            .map_err(|e| SourceError::Parse(format!("invalid Count: {}", e)))?;

        let ids = root
            .child("IdList")
            .map(|list| {
                list.children("Id")
                    .into_iter()
                    .filter_map(XmlElement::trimmed_text)
                    .collect()
            })
            .unwrap_or_default();

        Ok(IdList { count, ids })
    }

    /// Normalize a `PubmedArticleSet` document
    pub fn parse_articles(xml: &str) -> Result<Vec<PubMedPaper>, SourceError> {
        let root = XmlElement::parse(xml)?;
        if root.name() != "PubmedArticleSet" {
            return Err(SourceError::Parse(format!(
                "expected <PubmedArticleSet>, found <{}>",
                root.name()
            )));
        }

        root.children("PubmedArticle")
            .into_iter()
            .map(Self::parse_article)
            .collect()
    }

    fn parse_article(record: &XmlElement) -> Result<PubMedPaper, SourceError> {
        let citation = record
            .child("MedlineCitation")
            .ok_or_else(|| SourceError::Parse("article without MedlineCitation".to_string()))?;
        let pmid = citation
            .child_text("PMID")
            .ok_or_else(|| SourceError::Parse("article without PMID".to_string()))?;
        let article = citation.child("Article");

        let title = article
            .and_then(|a| a.child_text("ArticleTitle"))
            .unwrap_or_default();

        let authors = article
            .and_then(|a| a.child("AuthorList"))
            .map(|list| {
                list.children("Author")
                    .into_iter()
                    .filter_map(Self::author_name)
                    .collect()
            })
            .unwrap_or_default();

        let journal = article.and_then(|a| a.child("Journal"));

        Ok(PubMedPaper {
            url: PubMedPaper::url_for(&pmid),
            id: pmid,
            title,
            authors,
            r#abstract: article.and_then(Self::abstract_text),
            journal: journal.and_then(|j| j.child_text("Title")),
            published_date: journal
                .and_then(|j| j.find(&["JournalIssue", "PubDate"]))
                .and_then(Self::pub_date),
            doi: article
                .and_then(Self::eloc_doi)
                .or_else(|| Self::article_id_doi(record)),
        })
    }

    fn author_name(author: &XmlElement) -> Option<String> {
        if let Some(collective) = author.child_text("CollectiveName") {
            return Some(collective);
        }

        let last = author.child_text("LastName")?;
        match author
            .child_text("ForeName")
            .or_else(|| author.child_text("Initials"))
        {
            Some(first) => Some(format!("{} {}", first, last)),
            None => Some(last),
        }
    }

    fn abstract_text(article: &XmlElement) -> Option<String> {
        let sections: Vec<String> = article
            .child("Abstract")?
            .children("AbstractText")
            .into_iter()
            .filter_map(|section| {
                let text = section.trimmed_text()?;
                Some(match section.attr("Label") {
                    Some(label) => format!("{}: {}", label, text),
                    None => text,
                })
            })
            .collect();

        (!sections.is_empty()).then(|| sections.join(" "))
    }

    fn pub_date(date: &XmlElement) -> Option<String> {
        if let Some(medline) = date.child_text("MedlineDate") {
            return Some(medline);
        }

        let parts: Vec<String> = ["Year", "Month", "Day"]
            .iter()
            .filter_map(|name| date.child_text(name))
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    fn eloc_doi(article: &XmlElement) -> Option<String> {
        article
            .children("ELocationID")
            .into_iter()
            .find(|loc| loc.attr("EIdType") == Some("doi"))
            .and_then(XmlElement::trimmed_text)
    }

    fn article_id_doi(record: &XmlElement) -> Option<String> {
        record
            .find(&["PubmedData", "ArticleIdList"])?
            .children("ArticleId")
            .into_iter()
            .find(|id| id.attr("IdType") == Some("doi"))
            .and_then(XmlElement::trimmed_text)
    }

    async fn esearch(&self, request: &SearchRequest) -> Result<IdList, SourceError> {
        let params = self.with_api_key(vec![
            ("db", "pubmed".to_string()),
            ("term", self.build_query(request)),
            ("retmax", request.max_results.to_string()),
            ("sort", Self::sort_param(request).to_string()),
            ("retmode", "xml".to_string()),
        ]);

        self.limiter.reserve_slot().await;
        let xml = self
            .client
            .get_text(&self.esearch, &params, "PubMed esearch")
            .await?;
        Self::parse_id_list(&xml)
    }

    async fn efetch(&self, ids: &[String]) -> Result<Vec<PubMedPaper>, SourceError> {
        let params = self.with_api_key(vec![
            ("db", "pubmed".to_string()),
            ("id", ids.join(",")),
            ("retmode", "xml".to_string()),
        ]);

        self.limiter.reserve_slot().await;
        let xml = self
            .client
            .get_text(&self.efetch, &params, "PubMed efetch")
            .await?;
        Self::parse_articles(&xml)
    }
}

#[async_trait]
impl Source for PubMedSource {
    type Paper = PubMedPaper;

    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    fn rate_limit(&self) -> Duration {
        self.limiter.interval()
    }

    fn build_query(&self, request: &SearchRequest) -> String {
        Self::build_search_term(request)
    }

    #[instrument(skip(self, request), fields(source = "pubmed", query = %request.query))]
    async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse<PubMedPaper>, SourceError> {
        request.validate()?;

        let id_list = self.esearch(request).await?;
        if id_list.ids.is_empty() {
            debug!(count = id_list.count, "esearch returned no ids, skipping efetch");
            return Ok(SearchResponse::empty());
        }

        let papers = self.efetch(&id_list.ids).await?;
        info!(
            papers = papers.len(),
            total = id_list.count,
            "PubMed search complete"
        );
        Ok(SearchResponse::new(papers, id_list.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    const ESEARCH: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSearchResult PUBLIC "-//NLM//DTD esearch 20060628//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd">
<eSearchResult>
  <Count>2417</Count>
  <RetMax>2</RetMax>
  <RetStart>0</RetStart>
  <IdList>
    <Id>31978945</Id>
    <Id>32015507</Id>
  </IdList>
  <TranslationSet/>
  <QueryTranslation>covid[All Fields]</QueryTranslation>
</eSearchResult>"#;

    const EFETCH: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2024//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd">
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM">
      <PMID Version="1">31978945</PMID>
      <Article PubModel="Print-Electronic">
        <Journal>
          <JournalIssue CitedMedium="Internet">
            <Volume>382</Volume>
            <PubDate><Year>2020</Year><Month>Feb</Month><Day>20</Day></PubDate>
          </JournalIssue>
          <Title>The New England journal of medicine</Title>
        </Journal>
        <ArticleTitle>A Novel Coronavirus from Patients with <i>Pneumonia</i> in China, 2019.</ArticleTitle>
        <ELocationID EIdType="pii" ValidYN="Y">NEJMoa2001017</ELocationID>
        <ELocationID EIdType="doi" ValidYN="Y">10.1056/NEJMoa2001017</ELocationID>
        <Abstract>
          <AbstractText Label="BACKGROUND">In December 2019, a cluster of patients.</AbstractText>
          <AbstractText Label="METHODS">Samples were analyzed.</AbstractText>
        </Abstract>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y"><LastName>Zhu</LastName><ForeName>Na</ForeName><Initials>N</Initials></Author>
          <Author ValidYN="Y"><LastName>Zhang</LastName><Initials>D</Initials></Author>
          <Author ValidYN="Y"><CollectiveName>China Novel Coronavirus Investigating and Research Team</CollectiveName></Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM">
      <PMID Version="1">32015507</PMID>
      <Article PubModel="Print">
        <Journal>
          <JournalIssue CitedMedium="Internet">
            <PubDate><MedlineDate>2019 Nov-Dec</MedlineDate></PubDate>
          </JournalIssue>
          <Title>Nature</Title>
        </Journal>
        <ArticleTitle>  A pneumonia outbreak.  </ArticleTitle>
        <Abstract>
          <AbstractText>Single unlabeled abstract.</AbstractText>
        </Abstract>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y"><LastName>Zhou</LastName><ForeName>Peng</ForeName></Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">32015507</ArticleId>
        <ArticleId IdType="doi">10.1038/s41586-020-2012-7</ArticleId>
      </ArticleIdList>
    </PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_build_search_term_plain() {
        let request = SearchRequest::new("crispr AND cancer");
        assert_eq!(PubMedSource::build_search_term(&request), "crispr AND cancer");
    }

    #[test]
    fn test_build_search_term_year_range() {
        let request = SearchRequest::new("covid").year_start(2019).year_end(2021);
        assert_eq!(
            PubMedSource::build_search_term(&request),
            "(covid) AND (2019[PDAT] : 2021[PDAT])"
        );
    }

    #[test]
    fn test_build_search_term_one_sided_ranges_are_literal() {
        let request = SearchRequest::new("covid").year_start(2020);
        assert_eq!(
            PubMedSource::build_search_term(&request),
            "(covid) AND (2020[PDAT] : )"
        );

        let request = SearchRequest::new("covid").year_end(2020);
        assert_eq!(
            PubMedSource::build_search_term(&request),
            "(covid) AND ( : 2020[PDAT])"
        );
    }

    #[test]
    fn test_sort_param() {
        assert_eq!(PubMedSource::sort_param(&SearchRequest::new("x")), "relevance");
        let request = SearchRequest::new("x").sort_by(SortBy::SubmittedDate);
        assert_eq!(PubMedSource::sort_param(&request), "pub_date");
    }

    #[test]
    fn test_parse_id_list() {
        let list = PubMedSource::parse_id_list(ESEARCH).unwrap();
        assert_eq!(list.count, 2417);
        assert_eq!(list.ids, vec!["31978945", "32015507"]);
    }

    #[test]
    fn test_parse_id_list_single_and_empty() {
        let single = PubMedSource::parse_id_list(
            "<eSearchResult><Count>1</Count><IdList><Id>123</Id></IdList></eSearchResult>",
        )
        .unwrap();
        assert_eq!(single.ids, vec!["123"]);

        let empty = PubMedSource::parse_id_list(
            "<eSearchResult><Count>0</Count><IdList/></eSearchResult>",
        )
        .unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.ids.is_empty());
    }

    #[test]
    fn test_parse_id_list_error_element() {
        let result = PubMedSource::parse_id_list(
            "<eSearchResult><ERROR>Invalid query</ERROR></eSearchResult>",
        );
        assert!(matches!(result, Err(SourceError::Api(msg)) if msg.contains("Invalid query")));
    }

    #[test]
    fn test_parse_articles() {
        let papers = PubMedSource::parse_articles(EFETCH).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.id, "31978945");
        assert_eq!(
            first.title,
            "A Novel Coronavirus from Patients with Pneumonia in China, 2019."
        );
        assert_eq!(
            first.authors,
            vec![
                "Na Zhu",
                "D Zhang",
                "China Novel Coronavirus Investigating and Research Team"
            ]
        );
        assert_eq!(
            first.r#abstract.as_deref(),
            Some("BACKGROUND: In December 2019, a cluster of patients. METHODS: Samples were analyzed.")
        );
        assert_eq!(
            first.journal.as_deref(),
            Some("The New England journal of medicine")
        );
        assert_eq!(first.published_date.as_deref(), Some("2020 Feb 20"));
        assert_eq!(first.doi.as_deref(), Some("10.1056/NEJMoa2001017"));
        assert_eq!(first.url, "https://pubmed.ncbi.nlm.nih.gov/31978945/");

        let second = &papers[1];
        assert_eq!(second.title, "A pneumonia outbreak.");
        assert_eq!(second.authors, vec!["Peng Zhou"]);
        assert_eq!(second.r#abstract.as_deref(), Some("Single unlabeled abstract."));
        assert_eq!(second.published_date.as_deref(), Some("2019 Nov-Dec"));
        assert_eq!(second.doi.as_deref(), Some("10.1038/s41586-020-2012-7"));
    }

    #[test]
    fn test_single_doi_location() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>1</PMID>
            <Article><ArticleTitle>T</ArticleTitle>
                <ELocationID EIdType="doi">10.1/x</ELocationID>
            </Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;
        let papers = PubMedSource::parse_articles(xml).unwrap();
        assert_eq!(papers[0].doi.as_deref(), Some("10.1/x"));
        assert!(papers[0].authors.is_empty());
        assert_eq!(papers[0].r#abstract, None);
    }

    #[test]
    fn test_parse_articles_shape_faults() {
        assert!(matches!(
            PubMedSource::parse_articles("<eSearchResult/>"),
            Err(SourceError::Parse(_))
        ));
        assert!(matches!(
            PubMedSource::parse_articles(
                "<PubmedArticleSet><PubmedArticle><MedlineCitation/></PubmedArticle></PubmedArticleSet>"
            ),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn test_endpoints_from_base_url() {
        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        let config = PubMedConfig {
            base_url: "http://localhost:8080/entrez/eutils".to_string(),
            api_key: Some("k".to_string()),
            rate_limit_ms: None,
        };
        let source = PubMedSource::new(client, &config).unwrap();
        assert_eq!(
            source.esearch.as_str(),
            "http://localhost:8080/entrez/eutils/esearch.fcgi"
        );
        assert_eq!(
            source.efetch.as_str(),
            "http://localhost:8080/entrez/eutils/efetch.fcgi"
        );
        assert_eq!(source.rate_limit(), Duration::from_millis(100));
        assert_eq!(source.id(), "pubmed");

        let request = SearchRequest::new("covid").year_end(2020);
        assert_eq!(source.build_query(&request), "(covid) AND ( : 2020[PDAT])");
    }
}
