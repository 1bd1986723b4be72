use tracing::{Span, info, info_span, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result, Stage};
use crate::models::{IngestionArtifact, TrainerArtifact, ValidationArtifact};
use crate::stages::{DataIngestion, DataValidation, HttpFetcher, ModelTrainer, UltralyticsCli};

/// Context shared by the stages of a single run
#[derive(Clone, Debug)]
pub struct PipelineContext {
    pub run_id: Uuid,
    pub verbose: bool,
    span: Span,
}

impl PipelineContext {
    pub fn new(verbose: bool) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            verbose,
            span: info_span!("pipeline", run_id = %run_id, verbose),
        }
    }

    /// Span every stage of this run logs under
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Stage 1: fetch and unpack the dataset
pub trait Ingest {
    fn ingest(&self, context: &PipelineContext) -> Result<IngestionArtifact>;
}

/// Stage 2: check the unpacked dataset layout
pub trait Validate {
    fn validate(
        &self,
        ingestion: &IngestionArtifact,
        context: &PipelineContext,
    ) -> Result<ValidationArtifact>;
}

/// Stage 3: train and publish weights
pub trait Train {
    fn train(
        &self,
        ingestion: &IngestionArtifact,
        context: &PipelineContext,
    ) -> Result<TrainerArtifact>;
}

/// Where a run currently is (or where it stopped)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Ingested,
    Validated,
    Trained,
    Aborted,
}

/// Ingestion → validation → (gate) → training
pub struct TrainingPipeline<I, V, T> {
    ingestion: I,
    validation: V,
    trainer: T,
    context: PipelineContext,
    state: PipelineState,
}

impl TrainingPipeline<DataIngestion<HttpFetcher>, DataValidation, ModelTrainer<UltralyticsCli>> {
    /// Wire the real stages from a config
    pub fn standard(config: &PipelineConfig, context: PipelineContext) -> Result<Self> {
        let trainer_config = config.trainer();
        let backend = UltralyticsCli::new(trainer_config.command.clone());
        Ok(Self::new(
            DataIngestion::new(config.ingestion(), HttpFetcher::new()?),
            DataValidation::new(config.validation()),
            ModelTrainer::new(trainer_config, backend),
            context,
        ))
    }
}

impl<I: Ingest, V: Validate, T: Train> TrainingPipeline<I, V, T> {
    pub fn new(ingestion: I, validation: V, trainer: T, context: PipelineContext) -> Self {
        Self {
            ingestion,
            validation,
            trainer,
            context,
            state: PipelineState::NotStarted,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Run every stage in order. Each call starts over from `NotStarted`.
    pub fn run(&mut self) -> Result<TrainerArtifact> {
        self.state = PipelineState::NotStarted;
        let span = self.context.span().clone();
        let _entered = span.enter();

        let result = self.run_stages();
        if result.is_err() {
            self.state = PipelineState::Aborted;
        }
        result
    }

    fn run_stages(&mut self) -> Result<TrainerArtifact> {
        info!("starting data ingestion");
        let ingestion = self
            .ingestion
            .ingest(&self.context)
            .map_err(|e| PipelineError::in_stage(Stage::Ingestion, e))?;
        self.state = PipelineState::Ingested;
        info!(
            archive = %ingestion.archive_path().display(),
            feature_store = %ingestion.feature_store_path().display(),
            "data ingestion completed"
        );

        info!("starting data validation");
        let validation = self
            .validation
            .validate(&ingestion, &self.context)
            .map_err(|e| PipelineError::in_stage(Stage::Validation, e))?;
        self.state = PipelineState::Validated;

        if !validation.status() {
            warn!(
                missing = validation.missing().len(),
                report = %validation.report_path().display(),
                "data validation failed, skipping training"
            );
            return Err(PipelineError::ValidationFailed {
                report: validation.report_path().to_path_buf(),
            });
        }
        info!("data validation passed");

        info!("starting model training");
        let trained = self
            .trainer
            .train(&ingestion, &self.context)
            .map_err(|e| PipelineError::in_stage(Stage::Training, e))?;
        self.state = PipelineState::Trained;
        info!(weights = %trained.trained_model_path().display(), "model training completed");

        Ok(trained)
    }
}
