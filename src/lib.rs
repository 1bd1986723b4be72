pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use config::{IngestionConfig, PipelineConfig, TrainerConfig, ValidationConfig};
pub use error::{ErrorKind, PipelineError, Result, Stage};
pub use models::{IngestionArtifact, TrainerArtifact, ValidationArtifact};
pub use pipeline::{
    Ingest, PipelineContext, PipelineState, Train, TrainingPipeline, Validate,
};
pub use stages::{DataIngestion, DataValidation, ModelTrainer};
