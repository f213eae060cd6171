use std::collections::VecDeque;
use std::io::{self, Write, stdout};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::io::tty::{Tty, TtyError};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::{error, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyInput {
    Char(u8),
    Interrupt,
}

// Raw mode turns off ISIG, so Ctrl-C shows up here as a key rather than a signal.
fn translate_key(key: &KeyEvent) -> Option<KeyInput> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let byte = match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') if ctrl => return Some(KeyInput::Interrupt),
        KeyCode::Char(c) if ctrl && c.is_ascii_alphabetic() => (c.to_ascii_lowercase() as u8) & 0x1f,
        KeyCode::Char(c) if c.is_ascii() => c as u8,
        KeyCode::Enter => b'\n',
        KeyCode::Tab => b'\t',
        KeyCode::Backspace => 0x08,
        KeyCode::Esc => 0x1b,
        _ => return None,
    };
    Some(KeyInput::Char(byte))
}

/// The process's own terminal: keys come from crossterm's event queue, output goes
/// to stdout.
pub struct Console {
    pending: Mutex<VecDeque<u8>>,
    interrupted: AtomicBool,
    // Shared with whoever drives the run; cleared means stop.
    running: Arc<AtomicBool>,
}

impl Console {
    // How long a blocked read waits for an event before rechecking the run flag.
    const WAIT_POLL: Duration = Duration::from_millis(50);

    pub fn new() -> Self {
        Self::with_run_flag(Arc::new(AtomicBool::new(true)))
    }

    // Blocking reads give up with TtyError::Interrupted once running is cleared.
    pub fn with_run_flag(running: Arc<AtomicBool>) -> Self {
        Console {
            pending: Mutex::new(VecDeque::new()),
            interrupted: AtomicBool::new(false),
            running,
        }
    }

    fn handle_event(&self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };

        match translate_key(&key) {
            Some(KeyInput::Char(c)) => self.pending.lock().unwrap().push_back(c),
            Some(KeyInput::Interrupt) => self.interrupted.store(true, Ordering::SeqCst),
            None => trace!("Console: dropping key {key:?}"),
        }
    }

    // Moves every event that's already queued into the pending buffer, without waiting.
    fn pump(&self) -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            self.handle_event(event::read()?);
        }
        Ok(())
    }

    fn pump_logged(&self) {
        if let Err(e) = self.pump() {
            warn!("Console: failed to poll terminal events: {e}");
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Tty for Console {
    fn handle_output(&self, val: u8) {
        // Raw mode also disables output post-processing.
        let raw = terminal::is_raw_mode_enabled().unwrap_or(false);
        let mut out = stdout().lock();
        let res = if val == b'\n' && raw {
            out.write_all(b"\r\n")
        } else {
            out.write_all(&[val])
        };
        if let Err(e) = res {
            error!("Console: write failed: {e}");
        }
    }

    fn flush_output(&self) {
        if let Err(e) = stdout().flush() {
            error!("Console: flush failed: {e}");
        }
    }

    fn input_available(&self) -> bool {
        self.pump_logged();
        !self.pending.lock().unwrap().is_empty()
    }

    fn poll_input(&self) -> Option<u8> {
        self.pump_logged();
        self.pending.lock().unwrap().pop_front()
    }

    fn wait_input(&self) -> Result<u8, TtyError> {
        loop {
            if self.interrupted.swap(false, Ordering::SeqCst) || !self.running.load(Ordering::SeqCst) {
                return Err(TtyError::Interrupted);
            }
            if let Some(c) = self.pending.lock().unwrap().pop_front() {
                return Ok(c);
            }
            if event::poll(Self::WAIT_POLL)? {
                self.handle_event(event::read()?);
            }
        }
    }

    fn interrupt_requested(&self) -> bool {
        self.pump_logged();
        self.interrupted.swap(false, Ordering::SeqCst)
    }
}
