
use common::asm::Ins;
use common::decoder::decode;
use obj::ObjFile;

use std::fmt;

pub struct Disassembled {
    pub addr: u16,
    pub word: u16,
    pub ins: Ins,
}

impl Disassembled {
    pub fn is_zero(&self) -> bool {
        self.word == 0
    }
}

impl fmt::Display for Disassembled {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04x}: {:04x}\t{}", self.addr, self.word, self.ins.display_with_pc(self.addr))
    }
}

// Every word decodes to something, so data shows up as (odd looking) instructions.
pub fn disassemble(obj: &ObjFile) -> Vec<Disassembled> {
    obj.addrs()
        .zip(obj.words.iter())
        .map(|(addr, &word)| Disassembled { addr, word, ins: decode(word) })
        .collect()
}
