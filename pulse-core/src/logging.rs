//! Tracing initialization for the engine.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global tracing subscriber once.
///
/// The filter comes from `PULSE_LOG` (standard `EnvFilter` syntax),
/// falling back to `info`. Repeated calls are no-ops so tests and
/// embeddings can both call it safely.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    let filter = EnvFilter::try_from_env("PULSE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Returns true once [`init`] has run.
#[must_use]
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}
