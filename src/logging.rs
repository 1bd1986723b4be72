use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

/// Build the log sink for one run.
///
/// The caller decides how long it is active (normally via
/// `tracing::subscriber::with_default`), so two pipelines in one process
/// can log to different sinks. `RUST_LOG` overrides the level.
pub fn build_subscriber(verbose: bool, json: bool) -> Box<dyn Subscriber + Send + Sync> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        Box::new(builder.json().finish())
    } else {
        Box::new(builder.finish())
    }
}
