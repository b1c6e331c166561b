//! Tracing setup for hosts embedding the crate

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with an env-filter override.
///
/// Defaults to `voxmate=debug,info` when `RUST_LOG` is unset. Call once at
/// host startup; a second call is a no-op error from the subscriber and is
/// ignored here.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voxmate=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
