use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paper_gateway::config::{find_config_file, load_config, Config};
use paper_gateway::gateway::{self, AppState};
use paper_gateway::models::{SearchField, SearchRequest, SortBy, SortOrder};
use paper_gateway::sources::Source;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Paper Gateway - search arXiv and PubMed through one request shape
#[derive(Parser, Debug)]
#[command(name = "paper-gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search arXiv and PubMed through one uniform request", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Listen host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one search and print the JSON envelope
    Search {
        /// Source to query
        #[arg(value_enum)]
        source: SourceArg,

        /// Search query
        query: String,

        /// Field to match
        #[arg(long, value_enum, default_value_t = FieldArg::All)]
        field: FieldArg,

        /// Maximum number of results
        #[arg(long, short = 'm', default_value_t = 10)]
        max_results: usize,

        /// Sort field
        #[arg(long, value_enum, default_value_t = SortArg::Relevance)]
        sort_by: SortArg,

        /// Sort order
        #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
        order: OrderArg,

        /// First year to include
        #[arg(long)]
        year_start: Option<u32>,

        /// Last year to include
        #[arg(long)]
        year_end: Option<u32>,
    },

    /// List the sources and their rate limits
    Sources,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SourceArg {
    Arxiv,
    Pubmed,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FieldArg {
    All,
    Title,
    Author,
    Abstract,
    Category,
}

impl From<FieldArg> for SearchField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::All => SearchField::All,
            FieldArg::Title => SearchField::Title,
            FieldArg::Author => SearchField::Author,
            FieldArg::Abstract => SearchField::Abstract,
            FieldArg::Category => SearchField::Category,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortArg {
    Relevance,
    Updated,
    Submitted,
}

impl From<SortArg> for SortBy {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Relevance => SortBy::Relevance,
            SortArg::Updated => SortBy::LastUpdatedDate,
            SortArg::Submitted => SortBy::SubmittedDate,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Asc => SortOrder::Ascending,
            OrderArg::Desc => SortOrder::Descending,
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool, json: bool) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let level = if quiet { "error" } else { log_level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("paper_gateway={}", level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn resolve_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.or_else(find_config_file);
    if let Some(path) = &path {
        tracing::info!("Using config file: {}", path.display());
    }
    load_config(path.as_deref()).context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet, cli.log_json);

    let mut config = resolve_config(cli.config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let state = AppState::from_config(&config)?;
            gateway::serve(state, &config.server.address()).await?;
        }

        Commands::Search {
            source,
            query,
            field,
            max_results,
            sort_by,
            order,
            year_start,
            year_end,
        } => {
            let mut request = SearchRequest::new(query)
                .max_results(max_results)
                .search_field(field.into())
                .sort_by(sort_by.into())
                .sort_order(order.into());
            request.year_start = year_start;
            request.year_end = year_end;

            let state = AppState::from_config(&config)?;
            let output = match source {
                SourceArg::Arxiv => {
                    serde_json::to_string_pretty(&state.arxiv.search(&request).await?)?
                }
                SourceArg::Pubmed => {
                    serde_json::to_string_pretty(&state.pubmed.search(&request).await?)?
                }
            };
            println!("{}", output);
        }

        Commands::Sources => {
            let state = AppState::from_config(&config)?;
            println!("{:<8} {:<8} {:>10}", "ID", "NAME", "INTERVAL");
            println!(
                "{:<8} {:<8} {:>8}ms",
                state.arxiv.id(),
                state.arxiv.name(),
                state.arxiv.rate_limit().as_millis()
            );
            println!(
                "{:<8} {:<8} {:>8}ms",
                state.pubmed.id(),
                state.pubmed.name(),
                state.pubmed.rate_limit().as_millis()
            );
        }
    }

    Ok(())
}
