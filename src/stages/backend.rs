use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Everything the backend needs to run one training job
#[derive(Debug, Clone)]
pub struct TrainRequest<'a> {
    pub base_weights: &'a str,
    pub data_manifest: &'a Path,
    pub epochs: u32,
    pub batch_size: u32,
    pub image_size: u32,
    pub run_name: &'a str,
    pub cache: bool,
    pub verbose: bool,
    /// Root the backend must write its run directory under
    pub project_dir: &'a Path,
}

/// Where the finished job put its outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainOutcome {
    pub save_dir: PathBuf,
}

impl TrainOutcome {
    /// Best checkpoint the job is expected to leave behind
    pub fn best_weights(&self) -> PathBuf {
        self.save_dir.join("weights").join("best.pt")
    }
}

/// External training procedure
pub trait TrainingBackend {
    fn train(&self, request: &TrainRequest<'_>) -> Result<TrainOutcome>;
}

/// Runs training through the Ultralytics command-line interface.
///
/// The run directory is pinned with `project=`, `name=` and
/// `exist_ok=True`, so it is always `project_dir/run_name`.
pub struct UltralyticsCli {
    command: Vec<String>,
}

impl UltralyticsCli {
    /// `command` is the program followed by any leading arguments, e.g. `["yolo"]`
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn arguments(request: &TrainRequest<'_>) -> Vec<String> {
        vec![
            "detect".to_string(),
            "train".to_string(),
            format!("data={}", request.data_manifest.display()),
            format!("model={}", request.base_weights),
            format!("epochs={}", request.epochs),
            format!("batch={}", request.batch_size),
            format!("imgsz={}", request.image_size),
            format!("name={}", request.run_name),
            format!("project={}", request.project_dir.display()),
            format!("cache={}", if request.cache { "True" } else { "False" }),
            format!("verbose={}", if request.verbose { "True" } else { "False" }),
            "exist_ok=True".to_string(),
        ]
    }
}

impl TrainingBackend for UltralyticsCli {
    fn train(&self, request: &TrainRequest<'_>) -> Result<TrainOutcome> {
        let Some((program, leading)) = self.command.split_first() else {
            return Err(PipelineError::Training {
                command: String::new(),
                reason: "no training program configured".to_string(),
                source: None,
            });
        };
        let args = Self::arguments(request);
        let rendered = self
            .command
            .iter()
            .chain(args.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");

        info!(
            epochs = request.epochs,
            batch = request.batch_size,
            imgsz = request.image_size,
            "launching training"
        );
        debug!(command = %rendered, "training command");

        let status = Command::new(program)
            .args(leading)
            .args(&args)
            .status()
            .map_err(|e| PipelineError::Training {
                command: rendered.clone(),
                reason: "could not start process".to_string(),
                source: Some(e),
            })?;

        if !status.success() {
            return Err(PipelineError::Training {
                command: rendered,
                reason: format!("process exited with {}", status),
                source: None,
            });
        }

        Ok(TrainOutcome {
            save_dir: request.project_dir.join(request.run_name),
        })
    }
}
