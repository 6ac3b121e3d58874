use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor a configured level is available
pub const DEFAULT_FILTER: &str = "toolbox_ui=info";

/// Build the log filter. `RUST_LOG` wins over the configured level.
pub fn build_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        Some(level) => EnvFilter::new(format!("toolbox_ui={}", level)),
        None => EnvFilter::new(DEFAULT_FILTER),
    })
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_tracing(level: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_target(false)
        .try_init();
}
