use tracing::Level;
use tracing_subscriber::fmt;

/// Installs the global subscriber. Quiet runs only report warnings and errors.
pub fn init(verbose: bool) {
    let level = if verbose { Level::INFO } else { Level::WARN };
    let _ = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
