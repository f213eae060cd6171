use crate::helpers::{assemble, load, load_words, run};
use common::asm::{Cond, CondMask, Ins, JsrTarget, Reg, Src2, TrapVector};
use common::constants::PC_START;
use emu_lib::RunOutcome;

const HALT: Ins = Ins::Trap { vector: TrapVector::Halt as u8 };

fn br(n: bool, z: bool, p: bool, offset: i16) -> Ins {
    Ins::Br { mask: CondMask::from_flags(n, z, p), offset: offset as u16 }
}

fn addi(dr: Reg, sr1: Reg, imm: i16) -> Ins {
    Ins::Add { dr, sr1, src2: Src2::imm(imm) }
}

fn clear(dr: Reg) -> Ins {
    Ins::And { dr, sr1: dr, src2: Src2::imm(0) }
}

#[test]
fn count_loop() {
    let emu = run(&[
        clear(Reg::R0),
        clear(Reg::R1),
        addi(Reg::R1, Reg::R1, 10),
    // loop:
        addi(Reg::R0, Reg::R0, 1),
        addi(Reg::R1, Reg::R1, -1),
        br(false, false, true, -3),
        HALT,
    ]);
    assert_eq!(emu.reg_read(Reg::R0), 10);
    assert_eq!(emu.reg_read(Reg::R1), 0);
    assert_eq!(emu.cond(), Cond::Zero);
    assert_eq!(emu.pc(), PC_START + 7);
}

// r2 = r0 * r1 by repeated addition.
#[test]
fn multiply() {
    let (mut emu, _) = load(&[
        clear(Reg::R2),
        addi(Reg::R1, Reg::R1, 0),
        br(false, true, false, 3),
    // loop:
        Ins::Add { dr: Reg::R2, sr1: Reg::R2, src2: Src2::Reg(Reg::R0) },
        addi(Reg::R1, Reg::R1, -1),
        br(false, false, true, -3),
    // done:
        HALT,
    ]);
    emu.reg_write(Reg::R0, 123);
    emu.reg_write(Reg::R1, 45);
    assert_eq!(emu.run(), RunOutcome::Halted);
    assert_eq!(emu.reg_read(Reg::R2), 123 * 45);
}

// Two's complement negation via NOT and ADD.
#[test]
fn negate() {
    let (mut emu, _) = load(&[
        Ins::Not { dr: Reg::R1, sr: Reg::R0 },
        addi(Reg::R1, Reg::R1, 1),
        Ins::Add { dr: Reg::R2, sr1: Reg::R0, src2: Src2::Reg(Reg::R1) },
        HALT,
    ]);
    emu.reg_write(Reg::R0, 1000);
    assert_eq!(emu.run(), RunOutcome::Halted);
    assert_eq!(emu.reg_read(Reg::R1) as i16, -1000);
    assert_eq!(emu.reg_read(Reg::R2), 0);
    assert_eq!(emu.cond(), Cond::Zero);
}

// Copy a zero terminated string with LDR/STR, then print the copy.
#[test]
fn strcpy() {
    let mut prog = assemble(&[
        Ins::Lea { dr: Reg::R1, offset: 11 }, // src
        Ins::Lea { dr: Reg::R2, offset: 15 }, // dst
        Ins::Add { dr: Reg::R3, sr1: Reg::R2, src2: Src2::imm(0) },
    // loop:
        Ins::Ldr { dr: Reg::R0, base: Reg::R1, offset: 0 },
        Ins::Str { sr: Reg::R0, base: Reg::R2, offset: 0 },
        br(false, true, false, 3),
        addi(Reg::R1, Reg::R1, 1),
        addi(Reg::R2, Reg::R2, 1),
        br(true, true, true, -6),
    // done:
        Ins::Add { dr: Reg::R0, sr1: Reg::R3, src2: Src2::imm(0) },
        Ins::trap(TrapVector::Puts),
        HALT,
    ]);
    assert_eq!(prog.len(), 12);
    prog.extend("lc3!".bytes().map(u16::from));
    prog.push(0);
    // dst starts at word 17.
    prog.resize(17 + 8, 0xffff);

    let (mut emu, tty) = load_words(&prog);
    assert_eq!(emu.run(), RunOutcome::Halted);
    assert_eq!(tty.take_output_string(), "lc3!");
    assert_eq!(emu.get_state().mem_read(PC_START + 17 + 4), 0);
}

// Recursive sum 1..=n with a stack in r6.
#[test]
fn recursive_sum() {
    let (mut emu, _) = load(&[
        Ins::Jsr { target: JsrTarget::Offset(1) },
        HALT,
    // sum: r0 = n, returns r1 = 1 + ... + n
        addi(Reg::R6, Reg::R6, -1),
        Ins::Str { sr: Reg::R7, base: Reg::R6, offset: 0 },
        addi(Reg::R6, Reg::R6, -1),
        Ins::Str { sr: Reg::R0, base: Reg::R6, offset: 0 },
        clear(Reg::R1),
        addi(Reg::R0, Reg::R0, 0),
        br(false, true, false, 3),
        addi(Reg::R0, Reg::R0, -1),
        Ins::Jsr { target: JsrTarget::Offset((-9i16) as u16) },
        Ins::Ldr { dr: Reg::R0, base: Reg::R6, offset: 0 },
    // base:
        Ins::Add { dr: Reg::R1, sr1: Reg::R1, src2: Src2::Reg(Reg::R0) },
        addi(Reg::R6, Reg::R6, 1),
        Ins::Ldr { dr: Reg::R7, base: Reg::R6, offset: 0 },
        addi(Reg::R6, Reg::R6, 1),
        Ins::ret(),
    ]);
    emu.reg_write(Reg::R0, 10);
    emu.reg_write(Reg::R6, 0x5000);
    assert_eq!(emu.run(), RunOutcome::Halted);
    assert_eq!(emu.reg_read(Reg::R1), 55);
    assert_eq!(emu.reg_read(Reg::R6), 0x5000);
    assert_eq!(emu.pc(), PC_START + 2);
}
