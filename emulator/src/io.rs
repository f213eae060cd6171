pub mod console;
pub mod keyboard;
pub mod terminal;
pub mod tty;

use crate::EmulatorState;

/// A device that answers reads and writes at one or more addresses.
pub trait MMIOHandler: Send {
    fn default_addrs(&self) -> &[u16] {
        &[]
    }

    fn read_word(&mut self, emu: &mut EmulatorState, addr: u16) -> u16;
    fn write_word(&mut self, emu: &mut EmulatorState, addr: u16, val: u16);
}
