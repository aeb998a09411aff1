//! Logging and tracing initialization.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

const ENGINE_TARGET: &str = "framecam_camera_engine";

/// Build the filter for `config`. `RUST_LOG` wins when it is set and parses.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(filter_directives(config))
}

fn filter_directives(config: &LoggingConfig) -> String {
    match config.engine_level.as_deref().map(str::trim) {
        Some(level) if !level.is_empty() => format!("{},{ENGINE_TARGET}={level}", config.level),
        _ => config.level.clone(),
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(config: &LoggingConfig) -> bool {
    use tracing_subscriber::fmt;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(build_filter(config))
        .with_writer(std::io::stderr);

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.with_target(true).finish())
    };
    installed.is_ok()
}
