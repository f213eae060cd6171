use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use common::asm::Reg;
use emu_lib::io::console::Console;
use emu_lib::io::terminal::{INTERRUPTED_EXIT_CODE, RawModeGuard, install_interrupt_handler};
use emu_lib::{Emulator, RunOutcome};

use clap::Parser;
use log::{info, warn};


/// LC-3 Emulator
#[derive(Parser)]
struct Args {
    /// Image to execute: a big-endian origin word followed by the words to load there
    image: PathBuf,

    /// Address at which to start executing (e.g. 0x3000, x3000 or 12288). Defaults to
    /// the image's origin.
    #[arg(long, value_parser = parse_addr)]
    start: Option<u16>,

    /// Print the registers when the machine stops
    #[arg(long)]
    dump_regs: bool,
}

fn parse_addr(s: &str) -> Result<u16, String> {
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix('x'));
    let res = match hex {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => s.parse::<u16>(),
    };
    res.map_err(|e| format!("invalid address '{s}': {e}"))
}

fn dump_regs(emu: &Emulator) {
    for reg in Reg::GPRS {
        eprint!("{reg}: {:#06x}  ", emu.reg_read(reg));
    }
    eprintln!("pc: {:#06x}  cond: {}", emu.pc(), emu.cond());
}


fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let running = Arc::new(AtomicBool::new(true));
    if let Err(e) = install_interrupt_handler(running.clone()) {
        warn!("Couldn't install the SIGINT handler: {e}");
    }

    let mut emu = Emulator::new(Arc::new(Console::with_run_flag(running.clone())));
    let origin = match emu.load_image_file(&args.image) {
        Ok(origin) => origin,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.image.display());
            return ExitCode::from(2);
        }
    };
    emu.start_at(args.start.unwrap_or(origin));

    let outcome = {
        let _guard = RawModeGuard::acquire()
            .inspect_err(|e| warn!("Couldn't enable raw mode, running line buffered: {e}"))
            .ok();
        emu.run_while(&running)
    };
    info!("Run ended: {outcome:?} after {} instructions", emu.instructions_executed());

    if args.dump_regs {
        dump_regs(&emu);
    }

    match outcome {
        RunOutcome::Halted => ExitCode::SUCCESS,
        RunOutcome::Faulted(fault) => {
            eprintln!("Fault: {fault}");
            ExitCode::from(1)
        }
        RunOutcome::Stopped(reason) => {
            eprintln!("Stopped: {reason:?}");
            ExitCode::from(INTERRUPTED_EXIT_CODE)
        }
    }
}
