use common::asm::{Reg, TrapVector};
use common::constants::MEM_WORDS;

use crate::emulator::{Emulator, ExecRet, RunState, StopReason};
use crate::io::tty::TtyError;

use log::warn;
use num_traits::FromPrimitive;


impl Emulator {
    // pc is the address of the TRAP itself.
    pub(crate) fn exec_trap(&mut self, pc: u16, vector: u8) -> ExecRet {
        let Some(vector) = TrapVector::from_u8(vector) else {
            warn!("Unknown trap vector x{vector:02x} at {pc:#06x}, ignoring");
            return ExecRet::Ok;
        };

        match vector {
            TrapVector::Getc => self.trap_getc(pc),
            TrapVector::Out => {
                self.put_char(self.state.reg_read(Reg::R0) as u8);
                self.tty.flush_output();
                ExecRet::Ok
            }
            TrapVector::Puts => {
                self.trap_puts();
                ExecRet::Ok
            }
            TrapVector::In => self.trap_in(pc),
            TrapVector::Putsp => {
                self.trap_putsp();
                ExecRet::Ok
            }
            TrapVector::Halt => {
                self.tty.flush_output();
                self.run_state = RunState::Halted;
                ExecRet::Halt
            }
        }
    }

    fn put_char(&self, val: u8) {
        self.tty.handle_output(val);
    }

    fn put_str(&self, s: &str) {
        for b in s.bytes() {
            self.put_char(b);
        }
    }

    // Blocks for a character. On failure the PC goes back to the TRAP so the
    // instruction reruns on cont().
    fn wait_char(&mut self, pc: u16) -> Result<u8, ExecRet> {
        match self.tty.wait_input() {
            Ok(c) => Ok(c),
            Err(err) => {
                let reason = match err {
                    TtyError::Interrupted => StopReason::Interrupted,
                    TtyError::Closed => StopReason::InputClosed,
                    TtyError::Io(err) => {
                        warn!("Failed to read from terminal: {err}");
                        StopReason::InputClosed
                    }
                };
                self.state.set_pc(pc);
                Err(ExecRet::Stopped(reason))
            }
        }
    }

    fn trap_getc(&mut self, pc: u16) -> ExecRet {
        match self.wait_char(pc) {
            Ok(c) => {
                self.state.reg_write(Reg::R0, c as u16);
                ExecRet::Ok
            }
            Err(ret) => ret,
        }
    }

    // A retried IN (after a stopped read) doesn't prompt again.
    fn trap_in(&mut self, pc: u16) -> ExecRet {
        if self.prompted_in != Some(pc) {
            self.put_str("Enter a character: ");
            self.tty.flush_output();
            self.prompted_in = Some(pc);
        }
        match self.wait_char(pc) {
            Ok(c) => {
                self.prompted_in = None;
                self.put_char(c);
                self.tty.flush_output();
                self.state.reg_write(Reg::R0, c as u16);
                ExecRet::Ok
            }
            Err(ret) => ret,
        }
    }

    // One character per word, low byte, up to a zero word.
    fn trap_puts(&mut self) {
        let mut addr = self.state.reg_read(Reg::R0);
        for _ in 0..MEM_WORDS {
            let word = self.mem_read(addr);
            if word == 0 {
                break;
            }
            self.put_char(word as u8);
            addr = addr.wrapping_add(1);
        }
        self.tty.flush_output();
    }

    // Two characters per word, low byte first, up to the first zero byte.
    fn trap_putsp(&mut self) {
        let mut addr = self.state.reg_read(Reg::R0);
        'words: for _ in 0..MEM_WORDS {
            let word = self.mem_read(addr);
            for c in [word as u8, (word >> 8) as u8] {
                if c == 0 {
                    break 'words;
                }
                self.put_char(c);
            }
            addr = addr.wrapping_add(1);
        }
        self.tty.flush_output();
    }
}
