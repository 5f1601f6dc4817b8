//! Structured logging initialization, shared by every binary in the
//! workspace. JSON-formatted, `RUST_LOG`-filtered, matching how the
//! gateway's own `main.rs` wires up `tracing_subscriber`.

use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber. Idempotent: a second call in
/// the same process (e.g. from integration tests) is a harmless no-op.
pub fn init(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true);

    // `try_init` rather than `init` so a second call (common in tests that
    // spin up more than one service) doesn't panic.
    let _ = subscriber.try_init();

    tracing::info!(service = service_name, "telemetry initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_when_called_twice() {
        init("biblio-gateway-test");
        init("biblio-gateway-test");
    }
}
