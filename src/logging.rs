//! Tracing setup for hosts embedding the editor.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this more than
/// once is harmless; later calls leave the first subscriber in place.
pub fn init_tracing(default_filter: &str) {
    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if installed.is_ok() {
        tracing::debug!("Workout editor v{} logging ready", env!("CARGO_PKG_VERSION"));
    }
}
