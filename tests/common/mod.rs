mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from signlang for tests
pub use signlang::{
    ErrorKind, IngestionArtifact, PipelineConfig, PipelineContext, PipelineError, PipelineState,
    Stage, TrainerArtifact, ValidationArtifact,
};
