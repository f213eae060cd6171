
use disassembler::{Disassembled, disassemble};
use obj::ObjFile;

use std::ops::Range;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;

/// LC-3 Disassembler
#[derive(Parser)]
struct Args {
    /// Image to disassemble
    image: PathBuf,
}

fn remove_long_zeros(disassembly: &mut Vec<Disassembled>) {
    const THRESH: usize = 8;

    let mut ranges = vec![];
    let mut range_start = None;
    for (i, dis) in disassembly.iter().enumerate() {
        if dis.is_zero() {
            if range_start.is_none() {
                range_start = Some(i);
            }
        } else if let Some(start) = range_start {
            ranges.push(Range{start, end: i});
            range_start = None;
        }
    }
    if let Some(start) = range_start {
        ranges.push(Range{start, end: disassembly.len()});
    }

    for range in ranges.iter().rev() {
        if range.len() > THRESH {
            // Leave the first and last, an ellipses will be added between.
            debug!("Eliding {} zero words at {:#06x}", range.len() - 2, disassembly[range.start].addr);
            disassembly.drain(range.start + 1..range.end - 1);
        }
    }
}


fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let obj = match ObjFile::read_file(&args.image) {
        Ok(obj) => obj,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.image.display());
            return ExitCode::from(2);
        }
    };
    let mut disassembly = disassemble(&obj);

    remove_long_zeros(&mut disassembly);

    let mut prev: Option<Disassembled> = None;
    for dis in disassembly {
        if let Some(p) = &prev {
            if p.addr.wrapping_add(1) != dis.addr {
                println!("...");
            }
        }
        println!("{}", dis);
        prev = Some(dis);
    }

    ExitCode::SUCCESS
}
