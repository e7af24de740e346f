//! Subscriber setup for binaries and tests that embed the pipeline.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding `EnvFilter` directives.
pub const LOG_ENV: &str = "SEALEVEL_LOG";

/// Directives used when `SEALEVEL_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVES: &str = "sealevel_core=info,sealevel_storage=info,sealevel_analysis=info";

static INIT: Once = Once::new();

/// Install the global subscriber, filtered by `SEALEVEL_LOG`
/// (e.g. `SEALEVEL_LOG=sealevel_analysis=debug,sealevel_storage=warn`).
///
/// Only the first call does anything. Returns `true` if that call installed
/// the subscriber, `false` otherwise.
pub fn init_tracing() -> bool {
    init_tracing_with(DEFAULT_DIRECTIVES)
}

/// Like [`init_tracing`], falling back to `default_directives`.
pub fn init_tracing_with(default_directives: &str) -> bool {
    let mut installed = false;
    INIT.call_once(|| {
        let filter = match EnvFilter::try_from_env(LOG_ENV) {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new(default_directives),
        };
        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .with(filter);
        match subscriber.try_init() {
            Ok(()) => installed = true,
            // Host already owns the global dispatcher; log through it.
            Err(e) => tracing::debug!(error = %e, "global subscriber already set, keeping it"),
        }
    });
    installed
}
