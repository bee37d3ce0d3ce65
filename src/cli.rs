//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use pdf_crawler_core::config::{DEFAULT_TARGET_COUNT, parse_cutoff_date, resolve_query};
use pdf_crawler_core::download::{CONNECT_TIMEOUT_SECS, DEFAULT_OUTPUT_DIR, READ_TIMEOUT_SECS};
use pdf_crawler_core::manifest::DEFAULT_MANIFEST_FILE;
use pdf_crawler_core::search::DEFAULT_SEARCH_ENDPOINT;
use pdf_crawler_core::{ConfigError, CrawlConfig};

/// Search the web for PDF documents and download the matching ones.
///
/// Query terms are comma-separated and searched as `term filetype:pdf`,
/// joined with OR. Accepted documents are stored in the output directory and
/// recorded in a `URL,Filename` CSV manifest.
#[derive(Parser, Debug)]
#[command(name = "pdf-crawler")]
#[command(author, version, about)]
pub struct Args {
    /// Google Custom Search API key
    #[arg(short = 'k', long, env = "PDF_CRAWLER_API_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Custom Search engine ID (cx)
    #[arg(short = 'c', long, env = "PDF_CRAWLER_CSE_ID")]
    pub cse: Option<String>,

    /// Comma-separated search terms
    #[arg(short = 'q', long)]
    pub query: Option<String>,

    /// Number of PDFs to download
    #[arg(short = 'n', long, default_value_t = DEFAULT_TARGET_COUNT)]
    pub num: usize,

    /// Maximum file size in bytes
    #[arg(short = 's', long)]
    pub size: Option<u64>,

    /// Skip documents last modified before this date (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub cutoff_date: Option<String>,

    /// Accepted host suffix (repeatable)
    #[arg(long = "allowed-tld", value_name = "SUFFIX", default_value = ".de")]
    pub allowed_tlds: Vec<String>,

    /// Directory downloaded documents are stored in
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Manifest CSV file
    #[arg(long, default_value = DEFAULT_MANIFEST_FILE)]
    pub manifest: PathBuf,

    /// Do not prefix filenames with the last-modified date
    #[arg(long)]
    pub no_date_prefix: bool,

    /// Send the query verbatim instead of expanding comma-separated terms
    #[arg(long)]
    pub raw_query: bool,

    /// Connect timeout for document requests, in seconds
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS)]
    pub connect_timeout: u64,

    /// Total timeout for document requests, in seconds
    #[arg(long, default_value_t = READ_TIMEOUT_SECS)]
    pub read_timeout: u64,

    /// Search API endpoint
    #[arg(long, hide = true, default_value = DEFAULT_SEARCH_ENDPOINT)]
    pub search_endpoint: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(long)]
    pub quiet: bool,
}

impl Args {
    /// Converts parsed arguments into a validated [`CrawlConfig`].
    pub fn into_config(self) -> Result<CrawlConfig, ConfigError> {
        let query = resolve_query(self.query.as_deref().unwrap_or_default(), self.raw_query)?;
        let cutoff = self
            .cutoff_date
            .as_deref()
            .map(parse_cutoff_date)
            .transpose()?;

        let mut config = CrawlConfig::new(
            self.key.unwrap_or_default(),
            self.cse.unwrap_or_default(),
            query,
        );
        config.target = self.num;
        config.max_size = self.size;
        config.cutoff = cutoff;
        config.allowed_tlds = self.allowed_tlds;
        config.output_dir = self.output_dir;
        config.manifest_path = self.manifest;
        config.date_prefix = !self.no_date_prefix;
        config.search_endpoint = self.search_endpoint;
        config.connect_timeout_secs = self.connect_timeout;
        config.read_timeout_secs = self.read_timeout;

        config.validate()?;
        Ok(config)
    }
}
