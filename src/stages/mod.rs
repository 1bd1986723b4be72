pub mod archive;
pub mod backend;
pub mod ingestion;
pub mod trainer;
pub mod validation;

pub use archive::ArchiveFormat;
pub use backend::{TrainOutcome, TrainRequest, TrainingBackend, UltralyticsCli};
pub use ingestion::{DataIngestion, Fetch, HttpFetcher, resolve_download_url};
pub use trainer::ModelTrainer;
pub use validation::{DataValidation, render_report};
