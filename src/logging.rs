use tracing::Level;
use tracing_subscriber::EnvFilter;

pub fn verbosity_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// `RUST_LOG` when it parses, `warn` otherwise; each `-v` adds its level on top.
pub fn env_filter(verbose: u8, rust_log: Option<&str>) -> EnvFilter {
    let level = verbosity_level(verbose);
    match rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        Some(filter) if verbose == 0 => filter,
        Some(filter) => filter.add_directive(level.into()),
        None => EnvFilter::new(level.as_str().to_ascii_lowercase()),
    }
}

/// Install the stderr subscriber; stdout stays reserved for the report.
pub fn init(verbose: u8) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(verbose, rust_log.as_deref()))
        .init();
}
