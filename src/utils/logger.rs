use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(verbose: bool) -> EnvFilter {
    // RUST_LOG wins; otherwise info, or debug when verbose
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize the logging system writing to stderr
pub fn init_logger(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false) // Don't show module paths
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .try_init();
}

/// Initialize logging into a file, used while the TUI owns the terminal
pub fn init_file_logger(path: &Path, verbose: bool) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let _ = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .compact(),
        )
        .try_init();

    Ok(())
}
