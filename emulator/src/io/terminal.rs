use std::io;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::terminal;
use log::{debug, error, warn};

// Conventional shell status for a process ended by SIGINT.
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Holds the terminal in raw mode (no line buffering, no echo) for as long as it
/// lives. Dropping it restores the previous mode, which covers returns, faults,
/// stops and panics alike.
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn acquire() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        debug!("Terminal: raw mode enabled");
        Ok(RawModeGuard { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    match terminal::disable_raw_mode() {
        Ok(()) => debug!("Terminal: raw mode disabled"),
        Err(e) => error!("Terminal: failed to restore terminal mode: {e}"),
    }
}

/// Routes SIGINT to `running`. The first signal clears the flag, so the run stops at
/// an instruction boundary (or out of a blocked read) and the RawModeGuard restores
/// the terminal on the way out. If a second signal arrives before that happens, the
/// terminal is restored from the handler and the process exits.
pub fn install_interrupt_handler(running: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if stop_already_pending(&running) {
            warn!("Interrupted again, exiting");
            restore_terminal();
            process::exit(INTERRUPTED_EXIT_CODE as i32);
        }
    })
}

// Clears the run flag; true if it was already cleared.
fn stop_already_pending(running: &AtomicBool) -> bool {
    !running.swap(false, Ordering::SeqCst)
}
