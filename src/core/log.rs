//! Tracing setup for the binary. Diagnostics go to stderr; tables go to stdout.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// `RUST_LOG`, when set, replaces the default filter entirely. Otherwise
/// `--verbose` shows this crate's debug output plus warnings from
/// dependencies, and nothing is logged without it.
pub fn init_logging(verbose: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter.boxed(),
        Err(_) => default_targets(verbose).boxed(),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
    if let Err(e) = result {
        eprintln!("Logging was already initialized: {e}");
    }
}

fn default_targets(verbose: bool) -> Targets {
    if verbose {
        Targets::new()
            .with_target(env!("CARGO_CRATE_NAME"), LevelFilter::DEBUG)
            .with_default(LevelFilter::WARN)
    } else {
        Targets::new().with_default(LevelFilter::OFF)
    }
}
