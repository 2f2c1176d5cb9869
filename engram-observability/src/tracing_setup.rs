//! Tracing subscriber initialization. Call once at process startup;
//! later calls are no-ops.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber with env-filter control
/// (`RUST_LOG=engram=debug,...`). `json` switches to structured output
/// for log shippers.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    // A second init (tests, embedding hosts) is fine; keep the first.
    let _ = result;
}
