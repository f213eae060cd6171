use std::sync::Arc;

use crate::EmulatorState;
use crate::io::MMIOHandler;
use crate::io::tty::Tty;

use log::warn;

pub struct Keyboard {
    device: Arc<dyn Tty>,
}

impl Keyboard {
    // Keyboard Status Register
    pub const KBSR: u16 = 0xfe00;

    // Keyboard Data Register
    pub const KBDR: u16 = 0xfe02;

    const READY_SHIFT: u16 = 15;

    pub fn new(device: Arc<dyn Tty>) -> Self {
        Keyboard { device }
    }

    fn kbsr_read(&self) -> u16 {
        (self.device.input_available() as u16) << Self::READY_SHIFT
    }

    // Reading the data register consumes the character.
    fn kbdr_read(&self) -> u16 {
        self.device.poll_input().map_or(0, u16::from)
    }
}

impl MMIOHandler for Keyboard {
    fn read_word(&mut self, _: &mut EmulatorState, addr: u16) -> u16 {
        match addr {
            Self::KBSR => self.kbsr_read(),
            Self::KBDR => self.kbdr_read(),
            _ => panic!("Keyboard doesn't handle address {addr:#06x}"),
        }
    }

    // Both registers are read-only.
    fn write_word(&mut self, _: &mut EmulatorState, addr: u16, val: u16) {
        match addr {
            Self::KBSR | Self::KBDR => warn!("Keyboard: ignoring write of {val:#06x} to {addr:#06x}"),
            _ => panic!("Keyboard doesn't handle address {addr:#06x}"),
        }
    }

    fn default_addrs(&self) -> &[u16] {
        &[Self::KBSR, Self::KBDR]
    }
}
