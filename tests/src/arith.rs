use crate::helpers::load;
use common::asm::{Cond, Ins, Reg, Src2, TrapVector};
use emu_lib::{Emulator, RunOutcome};

fn run_with(prog: &[Ins], regs: &[(Reg, u16)]) -> Emulator {
    let (mut emu, _) = load(prog);
    for (reg, val) in regs {
        emu.reg_write(*reg, *val);
    }
    assert_eq!(emu.run(), RunOutcome::Halted);
    emu
}

fn halted(ins: Ins) -> [Ins; 2] {
    [ins, Ins::trap(TrapVector::Halt)]
}

#[test]
fn add_imm() {
    let prog = halted(Ins::Add { dr: Reg::R0, sr1: Reg::R1, src2: Src2::imm(-3) });
    let emu = run_with(&prog, &[(Reg::R1, 5)]);
    assert_eq!(emu.reg_read(Reg::R0), 2);
    assert_eq!(emu.cond(), Cond::Positive);
    assert_eq!(emu.reg_read(Reg::R1), 5, "source untouched");
}

#[test]
fn add_reg() {
    let prog = halted(Ins::Add { dr: Reg::R2, sr1: Reg::R3, src2: Src2::Reg(Reg::R4) });
    let emu = run_with(&prog, &[(Reg::R3, 0x1234), (Reg::R4, 0x1111)]);
    assert_eq!(emu.reg_read(Reg::R2), 0x2345);
    assert_eq!(emu.cond(), Cond::Positive);
}

#[test]
fn add_wraps() {
    let prog = halted(Ins::Add { dr: Reg::R0, sr1: Reg::R0, src2: Src2::imm(1) });
    let emu = run_with(&prog, &[(Reg::R0, 0x7fff)]);
    assert_eq!(emu.reg_read(Reg::R0), 0x8000);
    assert_eq!(emu.cond(), Cond::Negative);

    let emu = run_with(&prog, &[(Reg::R0, 0xffff)]);
    assert_eq!(emu.reg_read(Reg::R0), 0);
    assert_eq!(emu.cond(), Cond::Zero);
}

#[test]
fn add_to_self() {
    let prog = halted(Ins::Add { dr: Reg::R5, sr1: Reg::R5, src2: Src2::Reg(Reg::R5) });
    let emu = run_with(&prog, &[(Reg::R5, 0x0021)]);
    assert_eq!(emu.reg_read(Reg::R5), 0x0042);
}

#[test]
fn and_zero() {
    let prog = halted(Ins::And { dr: Reg::R0, sr1: Reg::R0, src2: Src2::imm(0) });
    let emu = run_with(&prog, &[(Reg::R0, 0xffff)]);
    assert_eq!(emu.reg_read(Reg::R0), 0);
    assert_eq!(emu.cond(), Cond::Zero);
}

#[test]
fn and_imm_sign_extends() {
    // #-2 is 0xfffe once extended, so only bit 0 is cleared.
    let prog = halted(Ins::And { dr: Reg::R1, sr1: Reg::R2, src2: Src2::imm(-2) });
    let emu = run_with(&prog, &[(Reg::R2, 0x8003)]);
    assert_eq!(emu.reg_read(Reg::R1), 0x8002);
    assert_eq!(emu.cond(), Cond::Negative);
}

#[test]
fn and_reg() {
    let prog = halted(Ins::And { dr: Reg::R1, sr1: Reg::R2, src2: Src2::Reg(Reg::R3) });
    let emu = run_with(&prog, &[(Reg::R2, 0x0ff0), (Reg::R3, 0x00ff)]);
    assert_eq!(emu.reg_read(Reg::R1), 0x00f0);
    assert_eq!(emu.cond(), Cond::Positive);
}

#[test]
fn not() {
    let prog = halted(Ins::Not { dr: Reg::R6, sr: Reg::R1 });
    let emu = run_with(&prog, &[(Reg::R1, 0x00ff)]);
    assert_eq!(emu.reg_read(Reg::R6), 0xff00);
    assert_eq!(emu.cond(), Cond::Negative);

    let emu = run_with(&prog, &[(Reg::R1, 0xffff)]);
    assert_eq!(emu.reg_read(Reg::R6), 0);
    assert_eq!(emu.cond(), Cond::Zero);
}

#[test]
fn cond_starts_zero() {
    let (emu, _) = load(&[]);
    assert_eq!(emu.cond(), Cond::Zero);
}
