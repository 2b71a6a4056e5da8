//! Tracing setup for binaries and integration tests that embed the engine.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset: engine crates at debug, the SQL
/// driver quiet.
pub const DEFAULT_FILTER: &str = "info,rental=debug,sqlx=warn";

/// Installs a global fmt subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // Fails only if a global subscriber is already installed.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init_tracing();
        init_tracing();
        tracing::debug!("tracing initialised");
    }
}
