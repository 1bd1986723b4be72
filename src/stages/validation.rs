use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ValidationConfig;
use crate::error::{PipelineError, Result};
use crate::models::{IngestionArtifact, ValidationArtifact};
use crate::pipeline::{PipelineContext, Validate};

/// Checks that the unpacked dataset has the layout a detection trainer expects
pub struct DataValidation {
    config: ValidationConfig,
}

impl DataValidation {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Required paths that do not exist under `dataset_dir`, in config order
    pub fn missing_paths(&self, dataset_dir: &Path) -> Vec<PathBuf> {
        let mut checked: Vec<PathBuf> = Vec::with_capacity(self.config.required_paths.len());
        let mut missing = Vec::new();
        for relative in &self.config.required_paths {
            let path = dataset_dir.join(relative);
            if checked.contains(&path) {
                continue;
            }
            if !path.exists() {
                missing.push(path.clone());
            }
            checked.push(path);
        }
        missing
    }

    pub fn run(&self, ingestion: &IngestionArtifact) -> Result<ValidationArtifact> {
        let dataset_dir = ingestion.dataset_dir(&self.config.dataset_dir_name);
        let missing = self.missing_paths(&dataset_dir);

        self.write_report(&missing)?;
        let artifact = ValidationArtifact::new(self.config.status_file.clone(), missing);

        if artifact.status() {
            info!(dataset = %dataset_dir.display(), "all required paths present");
            if let Some(audit_dir) = &self.config.audit_dir {
                copy_for_audit(ingestion.archive_path(), audit_dir)?;
            }
        } else {
            for path in artifact.missing() {
                warn!(path = %path.display(), "required path missing");
            }
        }

        Ok(artifact)
    }

    fn write_report(&self, missing: &[PathBuf]) -> Result<()> {
        let status_file = &self.config.status_file;
        if let Some(parent) = status_file.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PipelineError::io(format!("Failed to create {:?}", parent), e))?;
        }
        fs::write(status_file, render_report(missing))
            .map_err(|e| PipelineError::io(format!("Failed to write {:?}", status_file), e))
    }
}

impl Validate for DataValidation {
    fn validate(
        &self,
        ingestion: &IngestionArtifact,
        _context: &PipelineContext,
    ) -> Result<ValidationArtifact> {
        self.run(ingestion)
    }
}

/// Status report body: one status line, then one line per missing path
pub fn render_report(missing: &[PathBuf]) -> String {
    let mut report = format!("Validation status : {}\n", missing.is_empty());
    if !missing.is_empty() {
        report.push_str("Missing paths :\n");
        for path in missing {
            let _ = writeln!(report, "- {}", path.display());
        }
    }
    report
}

fn copy_for_audit(archive: &Path, audit_dir: &Path) -> Result<()> {
    let Some(name) = archive.file_name() else {
        return Ok(());
    };
    fs::create_dir_all(audit_dir)
        .map_err(|e| PipelineError::io(format!("Failed to create {:?}", audit_dir), e))?;
    let dest = audit_dir.join(name);
    if is_same_file(archive, &dest) {
        return Ok(());
    }
    fs::copy(archive, &dest).map_err(|e| {
        PipelineError::io(format!("Failed to copy {:?} to {:?}", archive, dest), e)
    })?;
    Ok(())
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
