
use common::asm::{Cond, NUM_REGS, Reg};
use common::constants::MEM_WORDS;

use log::trace;

// The register file and backing memory. This is separate from the Emulator so a
// mutable borrow can be passed to the MMIO handlers.
pub struct EmulatorState {
    num_ins: usize,
    mem: Vec<u16>,
    regs: [u16; NUM_REGS],
    cond: Cond,
}

impl EmulatorState {
    pub fn new() -> Self {
        EmulatorState {
            num_ins: 0usize,
            mem: vec![0; MEM_WORDS],
            regs: [0; NUM_REGS],
            cond: Cond::default(),
        }
    }

    pub fn inc_ins(&mut self) {
        self.num_ins += 1;
    }

    pub fn num_ins(&self) -> usize {
        self.num_ins
    }

    // Plain storage only; device registers are routed by the Emulator.
    pub fn mem_read(&self, addr: u16) -> u16 {
        self.mem[addr as usize]
    }

    pub fn mem_write(&mut self, addr: u16, val: u16) {
        trace!("Mem: writing {val:#06x} to {addr:#06x}");
        self.mem[addr as usize] = val;
    }

    pub fn reg_read(&self, reg: Reg) -> u16 {
        self.regs[reg as usize]
    }

    pub fn reg_write(&mut self, reg: Reg, val: u16) {
        trace!("Reg: writing {val:#06x} to {reg}");
        self.regs[reg as usize] = val;
    }

    pub fn pc(&self) -> u16 {
        self.reg_read(Reg::PC)
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.reg_write(Reg::PC, pc);
    }

    pub fn cond(&self) -> Cond {
        self.cond
    }

    pub fn set_cond(&mut self, cond: Cond) {
        self.cond = cond;
    }

    pub fn update_flags(&mut self, reg: Reg) {
        self.cond = Cond::of(self.reg_read(reg));
    }
}

impl Default for EmulatorState {
    fn default() -> Self {
        Self::new()
    }
}
