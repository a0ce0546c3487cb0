//! Configuration management.
//!
//! Settings come from an optional TOML file layered with environment
//! variables prefixed by `PAPER_GATEWAY__` (nested keys separated by `__`):
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8888
//!
//! [http]
//! timeout_secs = 30
//!
//! [arxiv]
//! base_url = "http://export.arxiv.org/api/query"
//! rate_limit_ms = 3000
//!
//! [pubmed]
//! base_url = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/"
//! api_key = "your-ncbi-key"
//! ```
//!
//! `PAPER_GATEWAY__PUBMED__API_KEY=...` overrides `pubmed.api_key`; when
//! neither is set the key falls back to `NCBI_API_KEY`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "PAPER_GATEWAY";

/// Default arXiv query endpoint
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Default E-utilities base URL
pub const PUBMED_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";

/// arXiv throttles per IP; one call every three seconds
pub const ARXIV_RATE_LIMIT_MS: u64 = 3000;

/// E-utilities allows 10 requests per second with an API key
pub const PUBMED_RATE_LIMIT_WITH_KEY_MS: u64 = 100;

/// E-utilities allows 3 requests per second without an API key
pub const PUBMED_RATE_LIMIT_WITHOUT_KEY_MS: u64 = 340;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub arxiv: ArxivConfig,

    #[serde(default)]
    pub pubmed: PubMedConfig,
}

/// Inbound HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` socket address string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// arXiv source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivConfig {
    #[serde(default = "default_arxiv_url")]
    pub base_url: String,

    /// Minimum spacing between two arXiv calls
    #[serde(default = "default_arxiv_rate_limit")]
    pub rate_limit_ms: u64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: default_arxiv_url(),
            rate_limit_ms: default_arxiv_rate_limit(),
        }
    }
}

impl ArxivConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

fn default_arxiv_url() -> String {
    ARXIV_API_URL.to_string()
}

fn default_arxiv_rate_limit() -> u64 {
    ARXIV_RATE_LIMIT_MS
}

/// PubMed (E-utilities) source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubMedConfig {
    /// Directory holding `esearch.fcgi` and `efetch.fcgi`
    #[serde(default = "default_pubmed_url")]
    pub base_url: String,

    /// NCBI API key sent as `api_key`
    #[serde(default = "default_ncbi_api_key")]
    pub api_key: Option<String>,

    /// Minimum spacing between two E-utilities calls; derived from the key when unset
    #[serde(default)]
    pub rate_limit_ms: Option<u64>,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: default_pubmed_url(),
            api_key: default_ncbi_api_key(),
            rate_limit_ms: None,
        }
    }
}

impl PubMedConfig {
    /// API key, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn rate_limit(&self) -> Duration {
        let ms = self.rate_limit_ms.unwrap_or(if self.api_key().is_some() {
            PUBMED_RATE_LIMIT_WITH_KEY_MS
        } else {
            PUBMED_RATE_LIMIT_WITHOUT_KEY_MS
        });
        Duration::from_millis(ms)
    }
}

fn default_pubmed_url() -> String {
    PUBMED_EUTILS_URL.to_string()
}

fn default_ncbi_api_key() -> Option<String> {
    std::env::var("NCBI_API_KEY").ok()
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Look for a config file in the platform config directory, then the working directory
pub fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        dirs::config_dir().map(|dir| dir.join("paper-gateway").join("config.toml")),
        Some(PathBuf::from("paper-gateway.toml")),
    ];

    candidates.into_iter().flatten().find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.address(), "127.0.0.1:8888");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.arxiv.base_url, ARXIV_API_URL);
        assert_eq!(config.arxiv.rate_limit(), Duration::from_millis(3000));
        assert_eq!(config.pubmed.base_url, PUBMED_EUTILS_URL);
    }

    #[test]
    fn test_pubmed_rate_limit_follows_api_key() {
        let mut pubmed = PubMedConfig {
            base_url: default_pubmed_url(),
            api_key: Some("secret".to_string()),
            rate_limit_ms: None,
        };
        assert_eq!(pubmed.rate_limit(), Duration::from_millis(100));

        pubmed.api_key = Some("  ".to_string());
        assert_eq!(pubmed.api_key(), None);
        assert_eq!(pubmed.rate_limit(), Duration::from_millis(340));

        pubmed.rate_limit_ms = Some(25);
        assert_eq!(pubmed.rate_limit(), Duration::from_millis(25));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[server]
port = 9000

[arxiv]
rate_limit_ms = 500

[pubmed]
base_url = "http://localhost:1234/eutils/"
api_key = "file-key"
rate_limit_ms = 50
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.arxiv.rate_limit_ms, 500);
        assert_eq!(config.arxiv.base_url, ARXIV_API_URL);
        assert_eq!(config.pubmed.base_url, "http://localhost:1234/eutils/");
        assert_eq!(config.pubmed.api_key(), Some("file-key"));
        assert_eq!(config.pubmed.rate_limit(), Duration::from_millis(50));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Some(Path::new("/nonexistent/paper-gateway.toml")));
        assert!(result.is_err());
    }
}
