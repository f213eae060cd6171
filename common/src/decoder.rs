use crate::asm::*;
use crate::misc::sign_extend;

/// Every operand field of an instruction word, extracted without regard to which
/// ones the opcode actually uses. Values are raw: nothing is sign extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    pub opcode: Opcode,
    pub dst: u16,      // [11:9], also SR of stores and n z p of BR
    pub src: u16,      // [8:6], also BaseR
    pub imm_flag: bool, // [5]
    pub imm5: u16,     // [4:0]
    pub src2: u16,     // [2:0]
    pub offset6: u16,  // [5:0]
    pub offset9: u16,  // [8:0]
    pub offset11: u16, // [10:0]
    pub long_flag: bool, // [11]
    pub trap_vector: u8, // [7:0]
}

fn field(word: u16, shift: usize, bits: u32) -> u16 {
    (word >> shift) & ((1u16 << bits) - 1)
}

impl Fields {
    pub fn from_word(word: u16) -> Fields {
        Fields {
            opcode: Opcode::of(word),
            dst: field(word, DST_SHIFT, Reg::NUM_BITS as u32),
            src: field(word, SRC_SHIFT, Reg::NUM_BITS as u32),
            imm_flag: word & Src2::IMM_FLAG != 0,
            imm5: field(word, 0, Src2::IMM_BITS),
            src2: field(word, 0, Reg::NUM_BITS as u32),
            offset6: field(word, 0, OFFSET6_BITS),
            offset9: field(word, 0, OFFSET9_BITS),
            offset11: field(word, 0, OFFSET11_BITS),
            long_flag: word & JsrTarget::LONG_FLAG != 0,
            trap_vector: (word & TRAP_VECTOR_MASK) as u8,
        }
    }

    fn dr(&self) -> Reg {
        Reg::from_field(self.dst)
    }

    fn sr(&self) -> Reg {
        Reg::from_field(self.src)
    }

    fn operand2(&self) -> Src2 {
        if self.imm_flag {
            Src2::Imm(sign_extend(self.imm5, Src2::IMM_BITS))
        } else {
            Src2::Reg(Reg::from_field(self.src2))
        }
    }

    fn pc_offset9(&self) -> u16 {
        sign_extend(self.offset9, OFFSET9_BITS)
    }

    fn base_offset6(&self) -> u16 {
        sign_extend(self.offset6, OFFSET6_BITS)
    }
}


pub fn decode(word: u16) -> Ins {
    let f = Fields::from_word(word);
    match f.opcode {
        Opcode::Br => Ins::Br { mask: CondMask::new(f.dst), offset: f.pc_offset9() },
        Opcode::Add => Ins::Add { dr: f.dr(), sr1: f.sr(), src2: f.operand2() },
        Opcode::Ld => Ins::Ld { dr: f.dr(), offset: f.pc_offset9() },
        Opcode::St => Ins::St { sr: f.dr(), offset: f.pc_offset9() },
        Opcode::Jsr => {
            let target = if f.long_flag {
                JsrTarget::Offset(sign_extend(f.offset11, OFFSET11_BITS))
            } else {
                JsrTarget::Reg(f.sr())
            };
            Ins::Jsr { target }
        }
        Opcode::And => Ins::And { dr: f.dr(), sr1: f.sr(), src2: f.operand2() },
        Opcode::Ldr => Ins::Ldr { dr: f.dr(), base: f.sr(), offset: f.base_offset6() },
        Opcode::Str => Ins::Str { sr: f.dr(), base: f.sr(), offset: f.base_offset6() },
        Opcode::Rti => Ins::Rti,
        Opcode::Not => Ins::Not { dr: f.dr(), sr: f.sr() },
        Opcode::Ldi => Ins::Ldi { dr: f.dr(), offset: f.pc_offset9() },
        Opcode::Sti => Ins::Sti { sr: f.dr(), offset: f.pc_offset9() },
        Opcode::Jmp => Ins::Jmp { base: f.sr() },
        Opcode::Res => Ins::Res,
        Opcode::Lea => Ins::Lea { dr: f.dr(), offset: f.pc_offset9() },
        Opcode::Trap => Ins::Trap { vector: f.trap_vector },
    }
}
