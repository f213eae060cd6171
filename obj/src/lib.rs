
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use common::constants::MEM_WORDS;
use common::mem::{ReadU16Be, WriteU16Be};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image unreadable: {0}")]
    Unreadable(#[from] io::Error),

    #[error("image truncated before its origin word")]
    Truncated,
}

/// A program image: an origin address and the words placed from there upward.
/// On disk it's the origin followed by the words, all big-endian, with no header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjFile {
    pub origin: u16,
    pub words: Vec<u16>,
}

impl ObjFile {
    pub fn new(origin: u16, words: Vec<u16>) -> ObjFile {
        assert!(words.len() <= MEM_WORDS - origin as usize, "Image doesn't fit above {origin:#06x}");
        ObjFile { origin, words }
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<ObjFile, ImageError> {
        let file = File::open(path)?;
        Self::read_from(&mut BufReader::new(file))
    }

    // Words that would run past the top of memory are left unread, as is a
    // dangling odd byte at the end.
    pub fn read_from(reader: &mut impl Read) -> Result<ObjFile, ImageError> {
        let origin = reader.read_u16_be()?.ok_or(ImageError::Truncated)?;

        let max_words = MEM_WORDS - origin as usize;
        let mut words = vec![];
        while words.len() < max_words {
            match reader.read_u16_be()? {
                Some(word) => words.push(word),
                None => break,
            }
        }

        Ok(ObjFile { origin, words })
    }

    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        writer.write_u16_be(self.origin)?;
        for word in &self.words {
            writer.write_u16_be(*word)?;
        }
        Ok(())
    }

    // Address of each word, in order.
    pub fn addrs(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.words.len()).map(|i| self.origin.wrapping_add(i as u16))
    }
}
