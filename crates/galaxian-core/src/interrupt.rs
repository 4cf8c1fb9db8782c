use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install the SIGINT handler. The first interrupt requests a clean stop at
/// the next pipeline boundary; a second one exits immediately.
pub fn install_signal_handler() {
    let _ = ctrlc::set_handler(move || {
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            std::process::exit(1);
        }
        SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
        eprintln!("\ninterrupt received; stopping after the current step (press again to force quit)");
    });
}

/// Whether the operator has requested a stop. Checked between fetches and
/// between build units; a single source or unit is never cut in half.
pub fn interrupted() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}
