use tracing_subscriber::EnvFilter;

/// Initialise logging to stderr. Without `verbose` only warnings are shown;
/// with it the default is `debug` and `RUST_LOG` may override it.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chamberctl=debug"))
    } else {
        EnvFilter::new("warn")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
