//! Structured logging setup for the credential rotator

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize JSON logging (for pipelines that ship logs)
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_logging(app_name: &str, default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    tracing::info!(app = app_name, "Logging initialized");
}

/// Initialize human-readable console logging
pub fn init_console_logging(app_name: &str, default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!(app = app_name, "Console logging initialized");
}
