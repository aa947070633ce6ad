//! Process-level setup for the command line front end.

/// Initialize logging with tracing_subscriber.
///
/// `RUST_LOG` overrides the default `info` level. Output goes to stderr so
/// stdout stays clean for the JSON result.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .with_ansi(true)
        .init();
}
