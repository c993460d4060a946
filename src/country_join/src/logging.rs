//! Tracing subscriber setup for the binary.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter, e.g.
/// `COUNTRY_JOIN_LOG=code_registry=debug,country_join=info`.
pub const LOG_ENV: &str = "COUNTRY_JOIN_LOG";

static INIT: Once = Once::new();

/// Installs a stderr fmt layer filtered by [`LOG_ENV`] (default `info`).
///
/// Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

        // try_init: tests may have installed a subscriber already.
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("logging initialized twice without panicking");
    }
}
