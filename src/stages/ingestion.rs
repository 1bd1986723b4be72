use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::config::IngestionConfig;
use crate::error::{PipelineError, Result};
use crate::models::IngestionArtifact;
use crate::pipeline::{Ingest, PipelineContext};
use crate::stages::archive;

/// Source of archive bytes
pub trait Fetch {
    /// Write the resource at `url` into `dest`, returning the byte count
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Blocking HTTP(S) fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| PipelineError::download("<client>", e))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client (proxy, timeouts, ...)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| PipelineError::download(url, e))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.starts_with("text/html") {
            return Err(PipelineError::unexpected_content(url, content_type));
        }

        let file = File::create(dest)
            .map_err(|e| PipelineError::io(format!("Failed to create {:?}", dest), e))?;
        let mut writer = BufWriter::new(file);
        let written = io::copy(&mut response, &mut writer)
            .map_err(|e| PipelineError::io(format!("Failed to write {:?}", dest), e))?;
        writer
            .flush()
            .map_err(|e| PipelineError::io(format!("Failed to flush {:?}", dest), e))?;
        Ok(written)
    }
}

/// Turn a Google Drive share link into its direct-download form.
/// Other URLs are returned unchanged.
pub fn resolve_download_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.host_str() != Some("drive.google.com") {
        return url.to_string();
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    match segments.as_slice() {
        ["file", "d", id, ..] => {
            format!("https://drive.google.com/uc?export=download&id={}", id)
        }
        _ => url.to_string(),
    }
}

/// Downloads the dataset archive and unpacks it into the feature store
pub struct DataIngestion<F> {
    config: IngestionConfig,
    fetcher: F,
}

impl<F: Fetch> DataIngestion<F> {
    pub fn new(config: IngestionConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch the archive into the ingestion directory
    pub fn download(&self) -> Result<PathBuf> {
        let dir = &self.config.ingestion_dir;
        fs::create_dir_all(dir)
            .map_err(|e| PipelineError::io(format!("Failed to create {:?}", dir), e))?;

        let archive_path = self.config.archive_path();
        let partial = partial_path(&archive_path);
        let url = resolve_download_url(&self.config.download_url);
        info!(url = %url, dest = %archive_path.display(), "downloading dataset");

        let bytes = match self.fetcher.fetch(&url, &partial) {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
        };
        fs::rename(&partial, &archive_path).map_err(|e| {
            PipelineError::io(
                format!("Failed to move {:?} to {:?}", partial, archive_path),
                e,
            )
        })?;

        info!(bytes, "download complete");
        Ok(archive_path)
    }

    /// Unpack `archive_path` into the feature store
    pub fn extract(&self, archive_path: &Path) -> Result<PathBuf> {
        let dest = &self.config.feature_store_dir;
        fs::create_dir_all(dest)
            .map_err(|e| PipelineError::io(format!("Failed to create {:?}", dest), e))?;

        archive::extract(archive_path, dest)?;
        debug!(archive = %archive_path.display(), dest = %dest.display(), "extracted");
        Ok(dest.clone())
    }

    pub fn run(&self) -> Result<IngestionArtifact> {
        let archive_path = self.download()?;
        let feature_store_path = self.extract(&archive_path)?;
        Ok(IngestionArtifact::new(archive_path, feature_store_path))
    }
}

impl<F: Fetch> Ingest for DataIngestion<F> {
    fn ingest(&self, _context: &PipelineContext) -> Result<IngestionArtifact> {
        self.run()
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
