use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://drive.google.com/file/d/1VJ8fl31MvTpDvA8w9TScMCmuhiwr_ozq/view?usp=sharing";

const DATA_INGESTION_DIR: &str = "data_ingestion";
const FEATURE_STORE_DIR: &str = "feature_store";
const DATA_VALIDATION_DIR: &str = "data_validation";
const STATUS_FILE: &str = "status.txt";
const MODEL_TRAINER_DIR: &str = "model_trainer";

/// File name of the trained weights inside the trainer directory
pub const WEIGHTS_FILE: &str = "best.pt";

/// Top-level settings for a pipeline run.
///
/// Every field has a default, so an empty (or missing) settings file
/// yields the stock sign-language setup. Stage configs are derived from
/// this with [`PipelineConfig::ingestion`], [`PipelineConfig::validation`]
/// and [`PipelineConfig::trainer`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub artifacts_dir: PathBuf,
    pub download_url: String,
    pub archive_name: String,
    /// Folder inside the archive that holds the dataset
    pub dataset_dir_name: String,
    pub manifest_name: String,
    /// Paths relative to the dataset folder that must exist, checked in order
    pub required_paths: Vec<PathBuf>,
    /// Where a validated archive is copied for traceability; `null` disables the copy
    pub audit_dir: Option<PathBuf>,
    pub base_weights: String,
    pub epochs: u32,
    pub batch_size: u32,
    pub image_size: u32,
    pub run_name: String,
    pub cache: bool,
    /// Program plus leading arguments used to launch training
    pub train_command: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts"),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            archive_name: "data.zip".to_string(),
            dataset_dir_name: "Sign_Language_Images".to_string(),
            manifest_name: "data.yaml".to_string(),
            required_paths: vec![
                PathBuf::from("train/images"),
                PathBuf::from("train/labels"),
                PathBuf::from("valid/images"),
                PathBuf::from("valid/labels"),
                PathBuf::from("data.yaml"),
            ],
            audit_dir: Some(PathBuf::from(".")),
            base_weights: "yolo11s.pt".to_string(),
            epochs: 50,
            batch_size: 5,
            image_size: 416,
            run_name: "yolov11_sign_language".to_string(),
            cache: true,
            train_command: vec!["yolo".to_string()],
        }
    }
}

impl PipelineConfig {
    /// Load settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_yaml(&raw).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw)?;
        config.check()?;
        Ok(config)
    }

    /// Reject settings no stage can run with. Call again after overriding fields.
    pub fn check(&self) -> anyhow::Result<()> {
        if !is_single_component(&self.run_name) {
            anyhow::bail!(
                "run_name must be a single directory name, got {:?}",
                self.run_name
            );
        }
        if self.train_command.is_empty() {
            anyhow::bail!("train_command must name a program");
        }
        if self.epochs == 0 || self.batch_size == 0 || self.image_size == 0 {
            anyhow::bail!("epochs, batch_size and image_size must be positive");
        }
        Ok(())
    }

    pub fn ingestion(&self) -> IngestionConfig {
        let ingestion_dir = self.artifacts_dir.join(DATA_INGESTION_DIR);
        IngestionConfig {
            download_url: self.download_url.clone(),
            feature_store_dir: ingestion_dir.join(FEATURE_STORE_DIR),
            archive_name: self.archive_name.clone(),
            ingestion_dir,
        }
    }

    pub fn validation(&self) -> ValidationConfig {
        ValidationConfig {
            dataset_dir_name: self.dataset_dir_name.clone(),
            required_paths: self.required_paths.clone(),
            status_file: self
                .artifacts_dir
                .join(DATA_VALIDATION_DIR)
                .join(STATUS_FILE),
            audit_dir: self.audit_dir.clone(),
        }
    }

    pub fn trainer(&self) -> TrainerConfig {
        TrainerConfig {
            base_weights: self.base_weights.clone(),
            epochs: self.epochs,
            batch_size: self.batch_size,
            image_size: self.image_size,
            run_name: self.run_name.clone(),
            cache: self.cache,
            dataset_dir_name: self.dataset_dir_name.clone(),
            manifest_name: self.manifest_name.clone(),
            trainer_dir: self.artifacts_dir.join(MODEL_TRAINER_DIR),
            command: self.train_command.clone(),
        }
    }

    /// Well-known location the serving side loads trained weights from
    pub fn canonical_weights_path(&self) -> PathBuf {
        self.trainer().weights_path()
    }
}

/// `name` names exactly one entry inside a directory (no separators, `.`, `..` or root)
pub(crate) fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

/// Where to fetch the dataset archive and where to unpack it
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub download_url: String,
    pub ingestion_dir: PathBuf,
    pub archive_name: String,
    pub feature_store_dir: PathBuf,
}

impl IngestionConfig {
    pub fn archive_path(&self) -> PathBuf {
        self.ingestion_dir.join(&self.archive_name)
    }
}

/// Which paths to check and where to write the status report
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub dataset_dir_name: String,
    pub required_paths: Vec<PathBuf>,
    pub status_file: PathBuf,
    pub audit_dir: Option<PathBuf>,
}

/// Training hyperparameters and output location
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub base_weights: String,
    pub epochs: u32,
    pub batch_size: u32,
    pub image_size: u32,
    pub run_name: String,
    pub cache: bool,
    pub dataset_dir_name: String,
    pub manifest_name: String,
    pub trainer_dir: PathBuf,
    pub command: Vec<String>,
}

impl TrainerConfig {
    /// Directory handed to the backend as its output root
    pub fn runs_dir(&self) -> PathBuf {
        self.trainer_dir.join("runs")
    }

    pub fn weights_path(&self) -> PathBuf {
        self.trainer_dir.join(WEIGHTS_FILE)
    }
}
