
/// Treats the low `bit_count` bits of `value` as a two's complement integer and
/// extends its sign through bit 15.
pub fn sign_extend(value: u16, bit_count: u32) -> u16 {
    assert!((1..=u16::BITS).contains(&bit_count), "Invalid sign extension width {bit_count}");
    if bit_count == u16::BITS {
        return value;
    }

    if (value >> (bit_count - 1)) & 0x1 != 0 {
        value | (u16::MAX << bit_count)
    } else {
        value
    }
}

pub fn swap_endian(value: u16) -> u16 {
    (value << u8::BITS) | (value >> u8::BITS)
}

// Images are big-endian on disk; words read in host order go through here.
pub fn from_big_endian(value: u16) -> u16 {
    if cfg!(target_endian = "little") {
        swap_endian(value)
    } else {
        value
    }
}

pub fn to_big_endian(value: u16) -> u16 {
    from_big_endian(value)
}
