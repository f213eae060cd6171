use crate::misc::sign_extend;

use std::fmt;

use derive_more::IsVariant;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    PC,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

// General purpose registers plus the PC.
pub const NUM_REGS: usize = 9;

impl Reg {
    pub const NUM_BITS: usize = 3;
    pub const MASK: u16 = (1u16 << Self::NUM_BITS) - 1;

    pub const GPRS: [Reg; 8] = [
        Reg::R0, Reg::R1, Reg::R2, Reg::R3, Reg::R4, Reg::R5, Reg::R6, Reg::R7,
    ];

    // Only the general purpose registers can be named by an instruction.
    pub fn from_field(bits: u16) -> Reg {
        Self::GPRS[(bits & Self::MASK) as usize]
    }

    pub fn encode(self) -> u16 {
        assert!(self != Reg::PC, "PC can't be encoded in an instruction");
        self as u16
    }
}


////////////////////////////////////////////////////////////////////////////////


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Br = 0,
    Add,
    Ld,
    St,
    Jsr,
    And,
    Ldr,
    Str,
    Rti,
    Not,
    Ldi,
    Sti,
    Jmp,
    Res,
    Lea,
    Trap,
}

impl Opcode {
    pub const NUM_BITS: usize = 4;
    pub const LOWER_BITS: usize = (u16::BITS as usize) - Self::NUM_BITS;

    // Every 4 bit pattern is assigned, so decoding the opcode can't fail.
    const ALL: [Opcode; 16] = [
        Opcode::Br, Opcode::Add, Opcode::Ld, Opcode::St,
        Opcode::Jsr, Opcode::And, Opcode::Ldr, Opcode::Str,
        Opcode::Rti, Opcode::Not, Opcode::Ldi, Opcode::Sti,
        Opcode::Jmp, Opcode::Res, Opcode::Lea, Opcode::Trap,
    ];

    pub fn of(word: u16) -> Opcode {
        Self::ALL[(word >> Self::LOWER_BITS) as usize]
    }

    pub fn bits(self) -> u16 {
        (self as u16) << Self::LOWER_BITS
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}


////////////////////////////////////////////////////////////////////////////////


/// The condition register. Exactly one flag is ever set, so it's an enum rather
/// than a bit set; the discriminants line up with the `n z p` bits of BR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IsVariant)]
pub enum Cond {
    Positive = 0b001,
    #[default]
    Zero = 0b010,
    Negative = 0b100,
}

impl Cond {
    pub fn of(val: u16) -> Cond {
        if val == 0 {
            Cond::Zero
        } else if val >> (u16::BITS - 1) != 0 {
            Cond::Negative
        } else {
            Cond::Positive
        }
    }

    pub fn bits(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let c = match self {
            Cond::Positive => 'P',
            Cond::Zero => 'Z',
            Cond::Negative => 'N',
        };
        write!(f, "{c}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CondMask(u16);

impl CondMask {
    pub const NUM_BITS: usize = 3;
    pub const MASK: u16 = (1u16 << Self::NUM_BITS) - 1;

    pub const NEVER: CondMask = CondMask(0);
    pub const ALWAYS: CondMask = CondMask(Self::MASK);

    pub fn new(bits: u16) -> CondMask {
        assert_eq!(bits & !Self::MASK, 0, "Invalid condition mask {bits:#b}");
        CondMask(bits)
    }

    pub fn from_flags(n: bool, z: bool, p: bool) -> CondMask {
        let mut bits = 0;
        if n {
            bits |= Cond::Negative.bits();
        }
        if z {
            bits |= Cond::Zero.bits();
        }
        if p {
            bits |= Cond::Positive.bits();
        }
        CondMask(bits)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn matches(self, cond: Cond) -> bool {
        self.0 & cond.bits() != 0
    }
}

impl fmt::Display for CondMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (cond, c) in [(Cond::Negative, 'n'), (Cond::Zero, 'z'), (Cond::Positive, 'p')] {
            if self.matches(cond) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}


////////////////////////////////////////////////////////////////////////////////


#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq)]
pub enum TrapVector {
    Getc = 0x20,
    Out,
    Puts,
    In,
    Putsp,
    Halt,
}

impl fmt::Display for TrapVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}


////////////////////////////////////////////////////////////////////////////////


// Second source operand of ADD and AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Src2 {
    Reg(Reg),
    Imm(u16), // Already sign extended
}

impl Src2 {
    pub const IMM_FLAG: u16 = 0x1 << 5;
    pub const IMM_BITS: u32 = 5;

    pub fn imm(val: i16) -> Src2 {
        Src2::Imm(val as u16)
    }

    fn encode(self) -> u16 {
        match self {
            Src2::Reg(r) => r.encode(),
            Src2::Imm(val) => Self::IMM_FLAG | encode_offset(val, Self::IMM_BITS),
        }
    }
}

impl fmt::Display for Src2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Src2::Reg(r) => write!(f, "{r}"),
            Src2::Imm(val) => write!(f, "#{}", *val as i16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum JsrTarget {
    Offset(u16), // Already sign extended
    Reg(Reg),
}

impl JsrTarget {
    pub const LONG_FLAG: u16 = 0x1 << 11;
}


////////////////////////////////////////////////////////////////////////////////


pub const DST_SHIFT: usize = 9;
pub const SRC_SHIFT: usize = 6;
pub const OFFSET6_BITS: u32 = 6;
pub const OFFSET9_BITS: u32 = 9;
pub const OFFSET11_BITS: u32 = 11;
pub const TRAP_VECTOR_MASK: u16 = 0xff;

fn encode_offset(offset: u16, bits: u32) -> u16 {
    let field = offset & ((1u16 << bits) - 1);
    debug_assert_eq!(sign_extend(field, bits), offset, "Offset {offset:#x} doesn't fit in {bits} bits");
    field
}


/// A decoded instruction. Each opcode owns exactly the operands it uses; offsets and
/// immediates are stored sign extended, ready for wrapping arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Ins {
    Br { mask: CondMask, offset: u16 },
    Add { dr: Reg, sr1: Reg, src2: Src2 },
    Ld { dr: Reg, offset: u16 },
    St { sr: Reg, offset: u16 },
    Jsr { target: JsrTarget },
    And { dr: Reg, sr1: Reg, src2: Src2 },
    Ldr { dr: Reg, base: Reg, offset: u16 },
    Str { sr: Reg, base: Reg, offset: u16 },
    Rti,
    Not { dr: Reg, sr: Reg },
    Ldi { dr: Reg, offset: u16 },
    Sti { sr: Reg, offset: u16 },
    Jmp { base: Reg },
    Res,
    Lea { dr: Reg, offset: u16 },
    Trap { vector: u8 },
}

impl Ins {
    pub fn opcode(&self) -> Opcode {
        match self {
            Ins::Br { .. } => Opcode::Br,
            Ins::Add { .. } => Opcode::Add,
            Ins::Ld { .. } => Opcode::Ld,
            Ins::St { .. } => Opcode::St,
            Ins::Jsr { .. } => Opcode::Jsr,
            Ins::And { .. } => Opcode::And,
            Ins::Ldr { .. } => Opcode::Ldr,
            Ins::Str { .. } => Opcode::Str,
            Ins::Rti => Opcode::Rti,
            Ins::Not { .. } => Opcode::Not,
            Ins::Ldi { .. } => Opcode::Ldi,
            Ins::Sti { .. } => Opcode::Sti,
            Ins::Jmp { .. } => Opcode::Jmp,
            Ins::Res => Opcode::Res,
            Ins::Lea { .. } => Opcode::Lea,
            Ins::Trap { .. } => Opcode::Trap,
        }
    }

    pub fn trap(vector: TrapVector) -> Ins {
        Ins::Trap { vector: vector as u8 }
    }

    pub fn ret() -> Ins {
        Ins::Jmp { base: Reg::R7 }
    }

    pub fn encode(&self) -> u16 {
        let dst = |r: Reg| r.encode() << DST_SHIFT;
        let src = |r: Reg| r.encode() << SRC_SHIFT;

        let operands = match *self {
            Ins::Br { mask, offset } => (mask.bits() << DST_SHIFT) | encode_offset(offset, OFFSET9_BITS),
            Ins::Add { dr, sr1, src2 } | Ins::And { dr, sr1, src2 } => dst(dr) | src(sr1) | src2.encode(),
            Ins::Ld { dr, offset } | Ins::Ldi { dr, offset } | Ins::Lea { dr, offset } => {
                dst(dr) | encode_offset(offset, OFFSET9_BITS)
            }
            Ins::St { sr, offset } | Ins::Sti { sr, offset } => dst(sr) | encode_offset(offset, OFFSET9_BITS),
            Ins::Jsr { target: JsrTarget::Offset(offset) } => {
                JsrTarget::LONG_FLAG | encode_offset(offset, OFFSET11_BITS)
            }
            Ins::Jsr { target: JsrTarget::Reg(base) } => src(base),
            Ins::Ldr { dr, base, offset } => dst(dr) | src(base) | encode_offset(offset, OFFSET6_BITS),
            Ins::Str { sr, base, offset } => dst(sr) | src(base) | encode_offset(offset, OFFSET6_BITS),
            // NOT's unused low bits are all ones in the reference encoding.
            Ins::Not { dr, sr } => dst(dr) | src(sr) | 0x3f,
            Ins::Jmp { base } => src(base),
            Ins::Trap { vector } => vector as u16,
            Ins::Rti | Ins::Res => 0,
        };

        self.opcode().bits() | operands
    }

    pub fn display_with_pc(&self, pc: u16) -> InsWithPc<'_> {
        InsWithPc(self, pc)
    }

    // pc is the address of this instruction; targets are relative to the word after it.
    pub fn fmt_with_pc(&self, f: &mut fmt::Formatter, pc: u16) -> fmt::Result {
        let next = pc.wrapping_add(1);
        match *self {
            Ins::Br { mask: CondMask::NEVER, .. } => fmt::Display::fmt(self, f),
            Ins::Br { mask, offset } => write!(f, "br{mask}\tx{:04x}", next.wrapping_add(offset)),
            Ins::Ld { dr, offset } | Ins::Ldi { dr, offset } | Ins::Lea { dr, offset } => {
                write!(f, "{}\t{dr}, x{:04x}", self.opcode(), next.wrapping_add(offset))
            }
            Ins::St { sr, offset } | Ins::Sti { sr, offset } => {
                write!(f, "{}\t{sr}, x{:04x}", self.opcode(), next.wrapping_add(offset))
            }
            Ins::Jsr { target: JsrTarget::Offset(offset) } => write!(f, "jsr\tx{:04x}", next.wrapping_add(offset)),
            _ => fmt::Display::fmt(self, f),
        }
    }
}

impl fmt::Display for Ins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = self.opcode();
        match *self {
            Ins::Br { mask: CondMask::NEVER, .. } => write!(f, "nop"),
            Ins::Br { mask, offset } => write!(f, "br{mask}\t#{}", offset as i16),
            Ins::Add { dr, sr1, src2 } | Ins::And { dr, sr1, src2 } => write!(f, "{op}\t{dr}, {sr1}, {src2}"),
            Ins::Ld { dr, offset } | Ins::Ldi { dr, offset } | Ins::Lea { dr, offset } => {
                write!(f, "{op}\t{dr}, #{}", offset as i16)
            }
            Ins::St { sr, offset } | Ins::Sti { sr, offset } => write!(f, "{op}\t{sr}, #{}", offset as i16),
            Ins::Jsr { target: JsrTarget::Offset(offset) } => write!(f, "jsr\t#{}", offset as i16),
            Ins::Jsr { target: JsrTarget::Reg(base) } => write!(f, "jsrr\t{base}"),
            Ins::Ldr { dr, base, offset } => write!(f, "{op}\t{dr}, {base}, #{}", offset as i16),
            Ins::Str { sr, base, offset } => write!(f, "{op}\t{sr}, {base}, #{}", offset as i16),
            Ins::Not { dr, sr } => write!(f, "{op}\t{dr}, {sr}"),
            Ins::Jmp { base: Reg::R7 } => write!(f, "ret"),
            Ins::Jmp { base } => write!(f, "{op}\t{base}"),
            Ins::Trap { vector } => match TrapVector::from_u8(vector) {
                Some(known) => write!(f, "{known}"),
                None => write!(f, "{op}\tx{vector:02x}"),
            },
            Ins::Rti | Ins::Res => write!(f, "{op}"),
        }
    }
}

// Just for formatting, like Path::Display()
pub struct InsWithPc<'a>(&'a Ins, u16);

impl fmt::Display for InsWithPc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt_with_pc(f, self.1)
    }
}
