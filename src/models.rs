use std::path::{Path, PathBuf};

/// Output of the ingestion stage: the downloaded archive and where it was unpacked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionArtifact {
    archive_path: PathBuf,
    feature_store_path: PathBuf,
}

impl IngestionArtifact {
    pub fn new(archive_path: PathBuf, feature_store_path: PathBuf) -> Self {
        Self {
            archive_path,
            feature_store_path,
        }
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn feature_store_path(&self) -> &Path {
        &self.feature_store_path
    }

    /// Root of the dataset inside the feature store
    pub fn dataset_dir(&self, dataset_dir_name: &str) -> PathBuf {
        self.feature_store_path.join(dataset_dir_name)
    }
}

/// Verdict of the layout check. A `false` status is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationArtifact {
    status: bool,
    report_path: PathBuf,
    missing: Vec<PathBuf>,
}

impl ValidationArtifact {
    pub fn new(report_path: PathBuf, missing: Vec<PathBuf>) -> Self {
        Self {
            status: missing.is_empty(),
            report_path,
            missing,
        }
    }

    pub fn status(&self) -> bool {
        self.status
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// Required paths that were absent, in check order
    pub fn missing(&self) -> &[PathBuf] {
        &self.missing
    }
}

/// Final trained weights, placed at the canonical path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerArtifact {
    trained_model_path: PathBuf,
}

impl TrainerArtifact {
    pub fn new(trained_model_path: PathBuf) -> Self {
        Self { trained_model_path }
    }

    pub fn trained_model_path(&self) -> &Path {
        &self.trained_model_path
    }
}
