use std::fmt;
use std::io;
use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by every pipeline stage
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline stage an error escaped from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingestion,
    Validation,
    Training,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingestion => "ingestion",
            Stage::Validation => "validation",
            Stage::Training => "training",
        };
        f.write_str(name)
    }
}

/// Coarse category of a failure, stable across wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local filesystem read/write failed
    Io,
    /// Remote fetch failed or returned a non-success status
    Network,
    /// Archive could not be read or unpacked
    Archive,
    /// The external training backend could not be run or exited with failure
    Training,
    /// Training finished but its expected weights file is absent
    MissingOutput,
    /// The dataset layout check returned a failing verdict
    ValidationFailed,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{context} (at {location})")]
    Io {
        context: String,
        location: &'static Location<'static>,
        #[source]
        source: io::Error,
    },

    #[error("failed to download {url} (at {location})")]
    Download {
        url: String,
        location: &'static Location<'static>,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {content_type} instead of an archive (at {location})")]
    UnexpectedContent {
        url: String,
        content_type: String,
        location: &'static Location<'static>,
    },

    #[error("failed to unpack archive {} (at {location})", path.display())]
    Archive {
        path: PathBuf,
        location: &'static Location<'static>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("training command `{command}` failed: {reason}")]
    Training {
        command: String,
        reason: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("training did not produce expected output: {}", path.display())]
    MissingTrainingOutput { path: PathBuf },

    #[error("validation failed: incorrect format (see {})", report.display())]
    ValidationFailed { report: PathBuf },

    #[error("{stage} stage failed")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    #[track_caller]
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            location: Location::caller(),
            source,
        }
    }

    #[track_caller]
    pub fn download(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Download {
            url: url.into(),
            location: Location::caller(),
            source,
        }
    }

    /// A fetch succeeded but served a page (login, virus-scan notice) instead of the file
    #[track_caller]
    pub fn unexpected_content(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::UnexpectedContent {
            url: url.into(),
            content_type: content_type.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn archive(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Archive {
            path: path.into(),
            location: Location::caller(),
            source: source.into(),
        }
    }

    /// Wrap an error that escaped `stage`
    pub fn in_stage(stage: Stage, source: PipelineError) -> Self {
        Self::Stage {
            stage,
            source: Box::new(source),
        }
    }

    /// Category of the innermost failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Io { .. } => ErrorKind::Io,
            PipelineError::Download { .. } | PipelineError::UnexpectedContent { .. } => {
                ErrorKind::Network
            }
            PipelineError::Archive { .. } => ErrorKind::Archive,
            PipelineError::Training { .. } => ErrorKind::Training,
            PipelineError::MissingTrainingOutput { .. } => ErrorKind::MissingOutput,
            PipelineError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            PipelineError::Stage { source, .. } => source.kind(),
        }
    }

    /// Outermost stage this error was attributed to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
