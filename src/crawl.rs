//! One complete crawl: search, filter, download, record.

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, CrawlConfig};
use crate::download::{
    DownloadError, DownloadStats, Downloader, EngineError, FilterPolicy, HttpClient, LinkReport,
};
use crate::manifest::{Manifest, ManifestError};
use crate::search::{CustomSearchClient, Paginator, SearchBackend, SearchError};

/// Fatal errors for a crawl run.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Search client could not be constructed.
    #[error("search client setup failed: {0}")]
    Search(#[from] SearchError),

    /// Download client could not be constructed.
    #[error("download client setup failed: {0}")]
    Client(#[from] DownloadError),

    /// Manifest could not be opened.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Local failure during the run.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Runs a crawl against the Custom Search API configured in `config`.
///
/// # Errors
///
/// Returns [`CrawlError`] for invalid configuration, client setup failures,
/// and local storage failures. Search and per-link network failures are not
/// errors.
pub async fn run_crawl<F>(config: &CrawlConfig, on_link: F) -> Result<DownloadStats, CrawlError>
where
    F: FnMut(&LinkReport),
{
    config.validate()?;
    let backend = CustomSearchClient::with_endpoint(
        &config.api_key,
        &config.engine_id,
        &config.search_endpoint,
    )?;
    run_crawl_with_backend(config, Box::new(backend), on_link).await
}

/// Runs a crawl with an injected search backend.
///
/// # Errors
///
/// See [`run_crawl`].
pub async fn run_crawl_with_backend<F>(
    config: &CrawlConfig,
    backend: Box<dyn SearchBackend>,
    on_link: F,
) -> Result<DownloadStats, CrawlError>
where
    F: FnMut(&LinkReport),
{
    config.validate()?;

    let client = HttpClient::with_timeouts(config.connect_timeout_secs, config.read_timeout_secs)?;
    let policy = FilterPolicy::new(&config.allowed_tlds, config.cutoff, config.max_size);
    debug!(allowed_tlds = ?policy.allowed_tlds(), "domain allow-list normalized");
    let manifest = Manifest::open(&config.manifest_path).await?;
    let downloader = Downloader::new(client, policy, manifest, &config.output_dir)
        .with_date_prefix(config.date_prefix);

    info!(
        backend = backend.name(),
        target = config.target,
        output_dir = %config.output_dir.display(),
        manifest = %config.manifest_path.display(),
        "starting crawl"
    );

    let mut paginator = Paginator::new(backend, config.query.clone());
    let stats = downloader.run(&mut paginator, config.target, on_link).await?;
    Ok(stats)
}
