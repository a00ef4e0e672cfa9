//! Graceful shutdown support via atomic flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

static FLAG: LazyLock<Arc<AtomicBool>> = LazyLock::new(|| Arc::new(AtomicBool::new(false)));

/// Global shutdown flag — set by SIGTERM/SIGINT handler
pub fn shutdown_flag() -> Arc<AtomicBool> {
    Arc::clone(&FLAG)
}

/// Check if shutdown was requested
pub fn is_shutdown_requested() -> bool {
    FLAG.load(Ordering::Relaxed)
}

/// Request shutdown (for signal handlers and tests)
pub fn request_shutdown() {
    FLAG.store(true, Ordering::Relaxed);
}

/// Register SIGINT/SIGTERM handlers that set the shutdown flag.
///
/// The polling loop checks the flag between attempts, so a signal during a
/// long export ends the run cleanly instead of mid-download.
pub fn install_signal_handlers() -> std::io::Result<()> {
    signal_hook::flag::register(signal_hook::consts::SIGINT, shutdown_flag())?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, shutdown_flag())?;
    Ok(())
}
