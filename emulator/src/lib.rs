pub mod emulator;
pub mod emulator_state;
pub mod io;
mod trap;

pub use emulator::{Emulator, ExecRet, Fault, RunOutcome, RunState, StopReason};
pub use emulator_state::EmulatorState;
pub use io::MMIOHandler;
