use std::io::{self, ErrorKind, Read, Write};

use crate::misc::{from_big_endian, to_big_endian};

pub trait ReadU16Be {
    // Returns None at the end of the stream. A dangling odd byte also counts as the
    // end, only whole words are returned.
    fn read_u16_be(&mut self) -> io::Result<Option<u16>>;
}

impl<T: Read> ReadU16Be for T {
    fn read_u16_be(&mut self) -> io::Result<Option<u16>> {
        let mut buf = [0u8; 2];
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => return Ok(None),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(Some(from_big_endian(u16::from_ne_bytes(buf))))
    }
}

////////////////////////////////////////////////////////////////////////////////

pub trait WriteU16Be {
    fn write_u16_be(&mut self, val: u16) -> io::Result<()>;
}

impl<T: Write> WriteU16Be for T {
    fn write_u16_be(&mut self, val: u16) -> io::Result<()> {
        self.write_all(&to_big_endian(val).to_ne_bytes())
    }
}
