
use common::asm::*;
use common::constants::MMIO_START;
use common::decoder::decode;
use obj::{ImageError, ObjFile};

use crate::EmulatorState;
use crate::MMIOHandler;
use crate::io::keyboard::Keyboard;
use crate::io::tty::Tty;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use delegate::delegate;
use derive_more::IsVariant;
use log::{debug, info};
use thiserror::Error;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("illegal opcode {opcode} at {pc:#06x}")]
    IllegalOpcode { pc: u16, opcode: Opcode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum StopReason {
    // The caller cleared the run flag.
    Requested,
    // The user hit Ctrl-C.
    Interrupted,
    // A blocking read found no more input.
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum RunState {
    Ready,
    Running,
    Halted,
    Faulted(Fault),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum ExecRet {
    Ok,
    Halt,
    Fault(Fault),
    Stopped(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum RunOutcome {
    Halted,
    Faulted(Fault),
    // Resumable with cont().
    Stopped(StopReason),
}


pub struct Emulator {
    pub(crate) state: EmulatorState,
    mmio_handlers: HashMap<u16, Arc<Mutex<dyn MMIOHandler>>>,
    pub(crate) tty: Arc<dyn Tty>,
    pub(crate) run_state: RunState,
    // Address of an IN whose prompt is already out but whose read was cut short.
    pub(crate) prompted_in: Option<u16>,
}

impl Emulator {
    // How many instructions run between checks for a Ctrl-C from the terminal.
    pub const INTERRUPT_POLL_INTERVAL: usize = 4096;

    pub fn new(tty: Arc<dyn Tty>) -> Emulator {
        let mut emu = Emulator {
            state: EmulatorState::new(),
            mmio_handlers: HashMap::new(),
            tty: tty.clone(),
            run_state: RunState::Ready,
            prompted_in: None,
        };
        emu.set_mmio_handler(Keyboard::new(tty));
        emu
    }

    delegate! {
        to self.state {
            pub fn reg_read(&self, reg: Reg) -> u16;
            pub fn reg_write(&mut self, reg: Reg, val: u16);
            pub fn pc(&self) -> u16;
            pub fn cond(&self) -> Cond;
            #[call(num_ins)]
            pub fn instructions_executed(&self) -> usize;
        }
    }

    pub fn get_state(&self) -> &EmulatorState {
        &self.state
    }

    pub fn get_state_mut(&mut self) -> &mut EmulatorState {
        &mut self.state
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    // Point the PC at pc and get ready to run from there.
    pub fn start_at(&mut self, pc: u16) {
        self.state.set_pc(pc);
        self.run_state = RunState::Ready;
        self.prompted_in = None;
    }

    // Run until a halt or fault.
    pub fn run(&mut self) -> RunOutcome {
        self.run_while(&AtomicBool::new(true))
    }

    // Run until a halt or fault, or until running is cleared. The flag is checked
    // before every instruction.
    pub fn run_while(&mut self, running: &AtomicBool) -> RunOutcome {
        let mut since_poll = 0usize;
        loop {
            if !running.load(Ordering::SeqCst) {
                return RunOutcome::Stopped(StopReason::Requested);
            }

            since_poll += 1;
            if since_poll == Self::INTERRUPT_POLL_INTERVAL {
                since_poll = 0;
                if self.tty.interrupt_requested() {
                    return RunOutcome::Stopped(StopReason::Interrupted);
                }
            }

            match self.step() {
                ExecRet::Ok => (),
                ExecRet::Halt => return RunOutcome::Halted,
                ExecRet::Fault(fault) => return RunOutcome::Faulted(fault),
                ExecRet::Stopped(reason) => return RunOutcome::Stopped(reason),
            }
        }
    }

    pub fn run_at(&mut self, pc: u16) -> RunOutcome {
        self.start_at(pc);
        self.run()
    }

    // Continue after a stop.
    pub fn cont(&mut self) -> RunOutcome {
        self.run()
    }

    // Fetch, decode and execute a single instruction. A halted or faulted machine
    // stays put.
    pub fn step(&mut self) -> ExecRet {
        match self.run_state {
            RunState::Halted => return ExecRet::Halt,
            RunState::Faulted(fault) => return ExecRet::Fault(fault),
            RunState::Ready => self.run_state = RunState::Running,
            RunState::Running => (),
        }

        let pc = self.state.pc();
        let word = self.mem_read(pc);
        self.state.set_pc(pc.wrapping_add(1));
        self.state.inc_ins();

        let ins = decode(word);
        debug!("PC: {pc:#06x}: {}", ins.display_with_pc(pc));
        self.exec(pc, &ins)
    }

    pub fn load_image(&mut self, reader: &mut impl Read) -> Result<u16, ImageError> {
        let obj = ObjFile::read_from(reader)?;
        self.load_obj(&obj);
        Ok(obj.origin)
    }

    pub fn load_image_file(&mut self, path: impl AsRef<Path>) -> Result<u16, ImageError> {
        let obj = ObjFile::read_file(path)?;
        self.load_obj(&obj);
        Ok(obj.origin)
    }

    // Doesn't touch the registers; the caller decides where to start.
    pub fn load_obj(&mut self, obj: &ObjFile) {
        for (addr, word) in obj.addrs().zip(obj.words.iter()) {
            self.mem_write(addr, *word);
        }
        info!("Loaded {} words at {:#06x}", obj.words.len(), obj.origin);
    }

    pub fn load_words(&mut self, start: u16, words: &[u16]) {
        for (i, word) in words.iter().enumerate() {
            self.mem_write(start.wrapping_add(i as u16), *word);
        }
    }

    pub fn set_mmio_handler_for<M, I>(&mut self, handler: M, addrs: I)
    where
        M: MMIOHandler + 'static,
        I: IntoIterator<Item = u16> {

        let handler = Arc::new(Mutex::new(handler));
        for addr in addrs.into_iter() {
            self.register_handler(handler.clone(), addr);
        }
    }

    pub fn set_mmio_handler(&mut self, handler: impl MMIOHandler + 'static) {
        let addrs = handler.default_addrs().to_vec();
        self.set_mmio_handler_for(handler, addrs);
    }

    fn register_handler(&mut self, handler: Arc<Mutex<dyn MMIOHandler>>, addr: u16) {
        assert!(addr >= MMIO_START, "MMIOHandler addr {addr:#06x} below device space");
        let prev = self.mmio_handlers.insert(addr, handler);
        assert!(prev.is_none(), "Duplicate MMIOHandler for {addr:#06x}");
    }


    ///////////////////////////////////////////////////////////////////////////


    pub fn mem_read(&mut self, addr: u16) -> u16 {
        if let Some(handler) = self.mmio_handlers.get(&addr) {
            return handler.lock().unwrap().read_word(&mut self.state, addr);
        }
        self.state.mem_read(addr)
    }

    pub fn mem_write(&mut self, addr: u16, val: u16) {
        if let Some(handler) = self.mmio_handlers.get(&addr) {
            handler.lock().unwrap().write_word(&mut self.state, addr, val);
            return;
        }
        self.state.mem_write(addr, val)
    }


    ///////////////////////////////////////////////////////////////////////////
    // Execute
    ///////////////////////////////////////////////////////////////////////////

    fn pc_relative(&self, offset: u16) -> u16 {
        self.state.pc().wrapping_add(offset)
    }

    fn base_relative(&self, base: Reg, offset: u16) -> u16 {
        self.state.reg_read(base).wrapping_add(offset)
    }

    fn read_src2(&self, src2: Src2) -> u16 {
        match src2 {
            Src2::Reg(r) => self.state.reg_read(r),
            Src2::Imm(val) => val,
        }
    }

    fn write_result(&mut self, dr: Reg, val: u16) {
        self.state.reg_write(dr, val);
        self.state.update_flags(dr);
    }

    fn exec_br(&mut self, mask: CondMask, offset: u16) {
        if mask.matches(self.state.cond()) {
            self.state.set_pc(self.pc_relative(offset));
        }
    }

    fn exec_jsr(&mut self, target: JsrTarget) {
        let ret = self.state.pc();
        // Read the base first, JSRR R7 jumps to the old R7.
        let dest = match target {
            JsrTarget::Offset(offset) => ret.wrapping_add(offset),
            JsrTarget::Reg(base) => self.state.reg_read(base),
        };
        self.state.reg_write(Reg::R7, ret);
        self.state.set_pc(dest);
    }

    // Rewinds the PC to the offending instruction and latches the fault.
    fn fault(&mut self, pc: u16, opcode: Opcode) -> ExecRet {
        let fault = Fault::IllegalOpcode { pc, opcode };
        self.state.set_pc(pc);
        self.run_state = RunState::Faulted(fault);
        ExecRet::Fault(fault)
    }

    // pc is the address of ins; the PC register has already moved past it.
    fn exec(&mut self, pc: u16, ins: &Ins) -> ExecRet {
        match *ins {
            Ins::Br { mask, offset } => self.exec_br(mask, offset),
            Ins::Add { dr, sr1, src2 } => {
                let val = self.state.reg_read(sr1).wrapping_add(self.read_src2(src2));
                self.write_result(dr, val);
            }
            Ins::And { dr, sr1, src2 } => {
                let val = self.state.reg_read(sr1) & self.read_src2(src2);
                self.write_result(dr, val);
            }
            Ins::Not { dr, sr } => {
                let val = !self.state.reg_read(sr);
                self.write_result(dr, val);
            }
            Ins::Ld { dr, offset } => {
                let val = self.mem_read(self.pc_relative(offset));
                self.write_result(dr, val);
            }
            Ins::Ldi { dr, offset } => {
                let addr = self.mem_read(self.pc_relative(offset));
                let val = self.mem_read(addr);
                self.write_result(dr, val);
            }
            Ins::Ldr { dr, base, offset } => {
                let val = self.mem_read(self.base_relative(base, offset));
                self.write_result(dr, val);
            }
            Ins::Lea { dr, offset } => {
                let addr = self.pc_relative(offset);
                self.write_result(dr, addr);
            }
            Ins::St { sr, offset } => {
                let val = self.state.reg_read(sr);
                self.mem_write(self.pc_relative(offset), val);
            }
            Ins::Sti { sr, offset } => {
                let val = self.state.reg_read(sr);
                let addr = self.mem_read(self.pc_relative(offset));
                self.mem_write(addr, val);
            }
            Ins::Str { sr, base, offset } => {
                let val = self.state.reg_read(sr);
                self.mem_write(self.base_relative(base, offset), val);
            }
            Ins::Jmp { base } => {
                let dest = self.state.reg_read(base);
                self.state.set_pc(dest);
            }
            Ins::Jsr { target } => self.exec_jsr(target),
            Ins::Trap { vector } => return self.exec_trap(pc, vector),
            Ins::Rti | Ins::Res => return self.fault(pc, ins.opcode()),
        }

        ExecRet::Ok
    }
}
