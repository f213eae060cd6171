
pub const MEM_WORDS: usize = 1 << u16::BITS;

// Conventional load address for user programs.
pub const PC_START: u16 = 0x3000;

pub const MMIO_START: u16 = 0xfe00;
