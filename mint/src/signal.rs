//! Signal handling for stopping a simulation early.
//!
//! Workers check the flag between opens, so a batch in progress always
//! completes and the offset record stays consistent.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Install a SIGINT/SIGTERM handler.
///
/// Returns a flag that becomes `true` on the first signal. A second signal
/// exits the process immediately.
pub fn install_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();

    ctrlc::set_handler(move || {
        if shutdown_flag.swap(true, Ordering::SeqCst) {
            tracing::warn!("Received second signal, forcing immediate exit");
            std::process::exit(1);
        }
        tracing::info!("Received shutdown signal, finishing in-flight opens...");
    })?;

    Ok(shutdown)
}
