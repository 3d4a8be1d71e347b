use tracing_subscriber::{fmt, EnvFilter};

/// Install the global fmt subscriber. `RUST_LOG` overrides the default `info`
/// level. Calling this again is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
