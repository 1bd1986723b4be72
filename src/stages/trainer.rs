use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{self, TrainerConfig};
use crate::error::{PipelineError, Result};
use crate::models::{IngestionArtifact, TrainerArtifact};
use crate::pipeline::{PipelineContext, Train};
use crate::stages::backend::{TrainRequest, TrainingBackend};

/// Trains from the unpacked dataset and publishes the best weights
pub struct ModelTrainer<B> {
    config: TrainerConfig,
    backend: B,
}

impl<B: TrainingBackend> ModelTrainer<B> {
    pub fn new(config: TrainerConfig, backend: B) -> Self {
        Self { config, backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// `verbose` asks the backend for per-epoch output
    pub fn run(&self, ingestion: &IngestionArtifact, verbose: bool) -> Result<TrainerArtifact> {
        let manifest = ingestion
            .dataset_dir(&self.config.dataset_dir_name)
            .join(&self.config.manifest_name);
        let project_dir = self.config.runs_dir();

        if !config::is_single_component(&self.config.run_name) {
            return Err(PipelineError::io(
                format!("Run name {:?} is not a single directory name", self.config.run_name),
                io::Error::from(io::ErrorKind::InvalidInput),
            ));
        }

        // The output check must only see files written by this run
        let run_dir = project_dir.join(&self.config.run_name);
        if run_dir.starts_with(&project_dir) && run_dir.exists() {
            debug!(dir = %run_dir.display(), "clearing previous run");
            fs::remove_dir_all(&run_dir)
                .map_err(|e| PipelineError::io(format!("Failed to clear {:?}", run_dir), e))?;
        }
        fs::create_dir_all(&project_dir)
            .map_err(|e| PipelineError::io(format!("Failed to create {:?}", project_dir), e))?;

        let request = TrainRequest {
            base_weights: &self.config.base_weights,
            data_manifest: &manifest,
            epochs: self.config.epochs,
            batch_size: self.config.batch_size,
            image_size: self.config.image_size,
            run_name: &self.config.run_name,
            cache: self.config.cache,
            verbose,
            project_dir: &project_dir,
        };
        let outcome = self.backend.train(&request)?;
        info!(
            epochs = self.config.epochs,
            batch = self.config.batch_size,
            save_dir = %outcome.save_dir.display(),
            "training finished"
        );

        let best = outcome.best_weights();
        if !best.is_file() {
            return Err(PipelineError::MissingTrainingOutput { path: best });
        }

        let published = self.publish(&best)?;
        Ok(TrainerArtifact::new(published))
    }

    /// Copy `best` to the canonical path without exposing a half-written file
    fn publish(&self, best: &Path) -> Result<PathBuf> {
        let dir = &self.config.trainer_dir;
        fs::create_dir_all(dir)
            .map_err(|e| PipelineError::io(format!("Failed to create {:?}", dir), e))?;

        let dest = self.config.weights_path();
        let staging = dest.with_extension("pt.partial");
        fs::copy(best, &staging).map_err(|e| {
            PipelineError::io(format!("Failed to copy {:?} to {:?}", best, staging), e)
        })?;
        fs::rename(&staging, &dest).map_err(|e| {
            PipelineError::io(format!("Failed to move {:?} to {:?}", staging, dest), e)
        })?;
        Ok(dest)
    }
}

impl<B: TrainingBackend> Train for ModelTrainer<B> {
    fn train(
        &self,
        ingestion: &IngestionArtifact,
        context: &PipelineContext,
    ) -> Result<TrainerArtifact> {
        self.run(ingestion, context.verbose)
    }
}
