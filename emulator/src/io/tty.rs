use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TtyError {
    #[error("interrupted")]
    Interrupted,

    #[error("input closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The terminal the keyboard device and the traps talk to.
pub trait Tty: Send + Sync {
    fn handle_output(&self, val: u8);
    fn flush_output(&self) {}

    // Non-blocking: neither consumes nor waits.
    fn input_available(&self) -> bool;
    // Non-blocking: takes the pending character, if any.
    fn poll_input(&self) -> Option<u8>;
    // Blocks until a character arrives.
    fn wait_input(&self) -> Result<u8, TtyError>;

    fn interrupt_requested(&self) -> bool {
        false
    }
}

////////////////////////////////////////////////////////////////////////////////

/// In-memory terminal. Input is queued up front; waiting on an empty queue reports
/// the input as closed instead of blocking.
#[derive(Default)]
pub struct PipeTty {
    out_buf: Mutex<VecDeque<u8>>,
    in_buf: Mutex<VecDeque<u8>>,
    interrupt: AtomicBool,
}

impl PipeTty {
    pub fn take_output(&self) -> VecDeque<u8> {
        std::mem::take(&mut self.out_buf.lock().unwrap())
    }

    pub fn take_output_string(&self) -> String {
        let out = self.take_output();
        String::from_utf8_lossy(&Vec::from(out)).into_owned()
    }

    pub fn is_out_empty(&self) -> bool {
        self.out_buf.lock().unwrap().is_empty()
    }

    pub fn push_input(&self, val: u8) {
        self.in_buf.lock().unwrap().push_back(val);
    }

    pub fn write_input(&self, vals: &[u8]) {
        for val in vals.iter() {
            self.push_input(*val);
        }
    }

    pub fn request_interrupt(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
    }
}

impl Tty for PipeTty {
    fn handle_output(&self, val: u8) {
        self.out_buf.lock().unwrap().push_back(val);
    }

    fn input_available(&self) -> bool {
        !self.in_buf.lock().unwrap().is_empty()
    }

    fn poll_input(&self) -> Option<u8> {
        self.in_buf.lock().unwrap().pop_front()
    }

    fn wait_input(&self) -> Result<u8, TtyError> {
        if self.interrupt.swap(false, Ordering::SeqCst) {
            return Err(TtyError::Interrupted);
        }
        self.poll_input().ok_or(TtyError::Closed)
    }

    fn interrupt_requested(&self) -> bool {
        self.interrupt.swap(false, Ordering::SeqCst)
    }
}
