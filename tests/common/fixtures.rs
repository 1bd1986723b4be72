use std::cell::RefCell;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use signlang::PipelineConfig;
use signlang::stages::{Fetch, HttpFetcher, TrainOutcome, TrainRequest, TrainingBackend};
use tar::Builder;
use zip::write::SimpleFileOptions;
use zstd::stream::write::Encoder as ZstdEncoder;

/// Folder name the dataset lives under inside the archive
pub const DATASET_DIR: &str = "Sign_Language_Images";

/// Every path the validator requires, relative to the dataset folder
pub const REQUIRED: [&str; 5] = [
    "train/images",
    "train/labels",
    "valid/images",
    "valid/labels",
    "data.yaml",
];

const MANIFEST: &str = "train: ../train/images\nval: ../valid/images\nnc: 2\nnames: ['A', 'B']\n";

/// Config rooted in `root` so nothing leaks into the working directory
pub fn test_config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        artifacts_dir: root.join("artifacts"),
        audit_dir: Some(root.join("audit")),
        ..PipelineConfig::default()
    }
}

/// Lay out a dataset on disk under `feature_store`, leaving out `skip`
pub fn write_dataset_tree(feature_store: &Path, skip: &[&str]) -> anyhow::Result<PathBuf> {
    let base = feature_store.join(DATASET_DIR);
    for entry in REQUIRED.iter().filter(|e| !skip.contains(e)) {
        let path = base.join(entry);
        if *entry == "data.yaml" {
            fs::create_dir_all(&base)?;
            fs::write(&path, MANIFEST)?;
        } else {
            fs::create_dir_all(&path)?;
            let sample = if entry.ends_with("images") { "0001.jpg" } else { "0001.txt" };
            fs::write(path.join(sample), b"sample")?;
        }
    }
    Ok(base)
}

/// Build a zip dataset archive at `dest`, leaving out `skip`
pub fn build_dataset_zip(dest: &Path, skip: &[&str]) -> anyhow::Result<PathBuf> {
    let mut writer = zip::ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default();

    writer.add_directory(format!("{}/", DATASET_DIR), options)?;
    for entry in REQUIRED.iter().filter(|e| !skip.contains(e)) {
        if *entry == "data.yaml" {
            writer.start_file(format!("{}/data.yaml", DATASET_DIR), options)?;
            writer.write_all(MANIFEST.as_bytes())?;
        } else {
            writer.add_directory(format!("{}/{}/", DATASET_DIR, entry), options)?;
            let sample = if entry.ends_with("images") { "0001.jpg" } else { "0001.txt" };
            writer.start_file(format!("{}/{}/{}", DATASET_DIR, entry, sample), options)?;
            writer.write_all(b"sample")?;
        }
    }
    writer.finish()?;
    Ok(dest.to_path_buf())
}

/// Build a tar.zst dataset archive at `dest`, leaving out `skip`
pub fn build_dataset_tar_zst(dest: &Path, skip: &[&str]) -> anyhow::Result<PathBuf> {
    let staging = tempfile::TempDir::new()?;
    write_dataset_tree(staging.path(), skip)?;

    let encoder = ZstdEncoder::new(File::create(dest)?, 3)?;
    let mut tar = Builder::new(encoder);
    tar.append_dir_all(DATASET_DIR, staging.path().join(DATASET_DIR))?;
    let encoder = tar.into_inner()?;
    encoder.finish()?;
    Ok(dest.to_path_buf())
}

/// Mock HTTP server holding one dataset archive; the mock lives as long as this value
pub struct ServedArchive {
    pub mock: mockito::Mock,
    pub url: String,
    _server: mockito::ServerGuard,
}

/// Answer `GET /dataset.zip` with `status`, `content_type` and `body`
pub fn serve_archive(status: usize, content_type: &str, body: Vec<u8>) -> ServedArchive {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/dataset.zip")
        .with_status(status)
        .with_header("content-type", content_type)
        .with_body(body)
        .create();
    ServedArchive {
        url: format!("{}/dataset.zip", server.url()),
        mock,
        _server: server,
    }
}

/// Serve a zip archive with a 200 response
pub fn serve_zip(body: Vec<u8>) -> ServedArchive {
    serve_archive(200, "application/zip", body)
}

/// HTTP fetcher that ignores proxy settings from the environment
pub fn local_http_fetcher() -> anyhow::Result<HttpFetcher> {
    let client = reqwest::blocking::Client::builder().no_proxy().build()?;
    Ok(HttpFetcher::with_client(client))
}

/// Fetcher that copies a local file, recording the URLs it was asked for
pub struct LocalFetcher {
    pub source: PathBuf,
    pub urls: RefCell<Vec<String>>,
}

impl LocalFetcher {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            urls: RefCell::new(Vec::new()),
        }
    }
}

impl Fetch for LocalFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> signlang::Result<u64> {
        self.urls.borrow_mut().push(url.to_string());
        fs::copy(&self.source, dest)
            .map_err(|e| signlang::PipelineError::io(format!("Failed to copy {:?}", self.source), e))
    }
}

/// What a [`FakeBackend`] was asked to do
#[derive(Debug, Clone)]
pub struct TrainCall {
    pub data_manifest: PathBuf,
    pub project_dir: PathBuf,
    pub run_name: String,
    pub epochs: u32,
    pub batch_size: u32,
    pub image_size: u32,
    pub verbose: bool,
}

/// Training backend that optionally writes a weights file instead of training
pub struct FakeBackend {
    pub produce_weights: bool,
    pub calls: RefCell<Vec<TrainCall>>,
}

impl FakeBackend {
    pub fn producing() -> Self {
        Self {
            produce_weights: true,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn silent() -> Self {
        Self {
            produce_weights: false,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl TrainingBackend for FakeBackend {
    fn train(&self, request: &TrainRequest<'_>) -> signlang::Result<TrainOutcome> {
        self.calls.borrow_mut().push(TrainCall {
            data_manifest: request.data_manifest.to_path_buf(),
            project_dir: request.project_dir.to_path_buf(),
            run_name: request.run_name.to_string(),
            epochs: request.epochs,
            batch_size: request.batch_size,
            image_size: request.image_size,
            verbose: request.verbose,
        });

        let outcome = TrainOutcome {
            save_dir: request.project_dir.join(request.run_name),
        };
        if self.produce_weights {
            let weights = outcome.best_weights();
            if let Some(parent) = weights.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| signlang::PipelineError::io("Failed to create weights dir", e))?;
            }
            fs::write(&weights, b"trained-weights")
                .map_err(|e| signlang::PipelineError::io("Failed to write weights", e))?;
        }
        Ok(outcome)
    }
}
