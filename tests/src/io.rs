use crate::helpers::{assemble, load, load_words};
use common::asm::{CondMask, Ins, Reg, TrapVector};
use common::constants::PC_START;
use emu_lib::io::keyboard::Keyboard;
use emu_lib::io::tty::{PipeTty, Tty};
use emu_lib::{Emulator, EmulatorState, MMIOHandler, RunOutcome};

use std::sync::Arc;

#[test]
fn status_then_data() {
    let (mut emu, tty) = load(&[]);
    assert_eq!(emu.mem_read(Keyboard::KBSR), 0);

    tty.push_input(b'g');
    assert_eq!(emu.mem_read(Keyboard::KBSR) >> 15, 1);
    assert_eq!(emu.mem_read(Keyboard::KBDR), b'g' as u16);
    assert_eq!(emu.mem_read(Keyboard::KBSR), 0);
}

#[test]
fn device_writes_ignored() {
    let (mut emu, tty) = load(&[]);
    tty.push_input(b'g');
    emu.mem_write(Keyboard::KBSR, 0);
    emu.mem_write(Keyboard::KBDR, 0x1234);
    assert_eq!(emu.mem_read(Keyboard::KBSR), 0x8000);
    assert_eq!(emu.mem_read(Keyboard::KBDR), b'g' as u16);
}

#[test]
fn poll_keyboard() {
    // Spin on KBSR, then read KBDR and print it.
    let mut prog = assemble(&[
    // poll:
        Ins::Ldi { dr: Reg::R1, offset: 4 },
        Ins::Br { mask: CondMask::from_flags(false, true, true), offset: (-2i16) as u16 },
        Ins::Ldi { dr: Reg::R0, offset: 3 },
        Ins::trap(TrapVector::Out),
        Ins::trap(TrapVector::Halt),
    ]);
    prog.extend([Keyboard::KBSR, Keyboard::KBDR]);

    let (mut emu, tty) = load_words(&prog);
    tty.push_input(b'%');
    assert_eq!(emu.run(), RunOutcome::Halted);
    assert_eq!(emu.reg_read(Reg::R0), b'%' as u16);
    assert_eq!(tty.take_output_string(), "%");
    assert!(!tty.input_available());
}

#[derive(Default)]
struct Latch {
    val: u16,
}

impl MMIOHandler for Latch {
    fn read_word(&mut self, _: &mut EmulatorState, _: u16) -> u16 {
        self.val
    }

    fn write_word(&mut self, _: &mut EmulatorState, _: u16, val: u16) {
        self.val = val;
    }
}

#[test]
fn custom_device() {
    const LATCH: u16 = 0xfe10;

    let mut prog = assemble(&[
        Ins::Sti { sr: Reg::R2, offset: 2 },
        Ins::Ldi { dr: Reg::R3, offset: 1 },
        Ins::trap(TrapVector::Halt),
    ]);
    prog.push(LATCH);

    let tty = Arc::new(PipeTty::default());
    let mut emu = Emulator::new(tty);
    emu.set_mmio_handler_for(Latch::default(), [LATCH]);
    emu.load_words(PC_START, &prog);
    emu.reg_write(Reg::R2, 0x0abc);
    assert_eq!(emu.run_at(PC_START), RunOutcome::Halted);
    assert_eq!(emu.reg_read(Reg::R3), 0x0abc);
    // Never reaches plain memory.
    assert_eq!(emu.get_state().mem_read(LATCH), 0);
}

#[test]
#[should_panic]
fn device_below_io_page() {
    let mut emu = Emulator::new(Arc::new(PipeTty::default()));
    emu.set_mmio_handler_for(Latch::default(), [0x3000]);
}

// Each machine owns its own state; only the terminal is shared.
#[test]
fn two_machines() {
    let tty = Arc::new(PipeTty::default());
    let mut a = Emulator::new(tty.clone());
    let mut b = Emulator::new(tty.clone());
    for emu in [&mut a, &mut b] {
        emu.load_words(PC_START, &assemble(&[
            Ins::trap(TrapVector::Getc),
            Ins::trap(TrapVector::Halt),
        ]));
        emu.start_at(PC_START);
    }
    b.reg_write(Reg::R5, 5);

    tty.write_input(b"12");
    assert_eq!(a.run(), RunOutcome::Halted);
    assert_eq!(b.run(), RunOutcome::Halted);
    assert_eq!(a.reg_read(Reg::R0), b'1' as u16);
    assert_eq!(b.reg_read(Reg::R0), b'2' as u16);
    assert_eq!(a.reg_read(Reg::R5), 0);
}
