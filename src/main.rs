use clap::{Parser, Subcommand};
use std::path::PathBuf;

use signlang::logging;
use signlang::stages::{DataIngestion, DataValidation, HttpFetcher};
use signlang::{IngestionArtifact, PipelineConfig, PipelineContext, TrainingPipeline};

#[derive(Parser)]
#[command(name = "signlang")]
#[command(about = "Fetch, check and train a sign-language detection dataset")]
struct Cli {
    /// YAML settings file (defaults are used when omitted)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run ingestion, validation and training
    Train {
        /// Dataset archive URL
        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        epochs: Option<u32>,

        #[arg(long)]
        batch_size: Option<u32>,
    },

    /// Download and unpack the dataset only
    Ingest {
        /// Dataset archive URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Check an already unpacked dataset
    Validate {
        /// Directory the archive was unpacked into
        #[arg(long, value_name = "DIR")]
        feature_store: PathBuf,

        /// Archive to copy for audit when the check passes
        #[arg(long, value_name = "FILE")]
        archive: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let subscriber = logging::build_subscriber(args.verbose, args.json_logs);
    tracing::subscriber::with_default(subscriber, || run(args.command, &mut config, args.verbose))
}

fn run(command: Command, config: &mut PipelineConfig, verbose: bool) -> anyhow::Result<()> {
    match command {
        Command::Train {
            url,
            epochs,
            batch_size,
        } => {
            if let Some(url) = url {
                config.download_url = url;
            }
            if let Some(epochs) = epochs {
                config.epochs = epochs;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            config.check()?;

            let mut pipeline = TrainingPipeline::standard(config, PipelineContext::new(verbose))?;
            let trained = pipeline.run()?;
            println!("Run:     {}", pipeline.context().run_id);
            println!("Weights: {}", trained.trained_model_path().display());
        }
        Command::Ingest { url } => {
            if let Some(url) = url {
                config.download_url = url;
            }

            let ingestion = DataIngestion::new(config.ingestion(), HttpFetcher::new()?);
            let artifact = ingestion.run()?;
            println!("Archive:       {}", artifact.archive_path().display());
            println!("Feature store: {}", artifact.feature_store_path().display());
        }
        Command::Validate {
            feature_store,
            archive,
        } => {
            let mut validation_config = config.validation();
            if archive.is_none() {
                validation_config.audit_dir = None;
            }
            let artifact = IngestionArtifact::new(archive.unwrap_or_default(), feature_store);
            let verdict = DataValidation::new(validation_config).run(&artifact)?;

            println!("Validation status : {}", verdict.status());
            for path in verdict.missing() {
                println!("  missing: {}", path.display());
            }
            println!("Report: {}", verdict.report_path().display());

            if !verdict.status() {
                anyhow::bail!("validation failed: incorrect format");
            }
        }
    }

    Ok(())
}
