//! Ctrl+C handling. The first interrupt asks the current wait loop to stop, a second one exits
//! immediately.

use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Exit code of a process terminated by SIGINT.
const EXIT_CODE_INTERRUPTED: i32 = 130;

pub fn install() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
        warn!("Interrupted, stopping. Objects already created on the cluster are left as they are. Press Ctrl+C again to exit immediately.");
    })
}

pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}
