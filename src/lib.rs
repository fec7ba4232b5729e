//! ## Design
//!
//! Conformance harness for an external CHIP-8 VM. We never run CHIP-8 code
//! ourselves; we build tiny ROMs, hand them to the VM in test mode and look
//! at the state it dumps when it's done.
//!
//! * ROMs are synthesised, not hand-assembled: each one is a short body for
//!   one opcode, wrapped in a CALL/RET so the VM's own call and return are
//!   exercised every time, and so that "returned past the first CALL" means
//!   "test over, dump now"
//! * every ROM gets a listing on disk next to it, produced by the same
//!   disassembler that decodes the binary, so they can be checked against
//!   each other
//! * the VM is only reachable through `<vm> <rom> --test`, its exit code and
//!   the dump file it writes. The `Vm` trait is that boundary
//! * dumps have a fixed byte layout owned by the VM (little-endian fields,
//!   unlike the big-endian instruction words)
//! * expectations are a handful of assertions per ROM: a register, some
//!   memory cells, a timer. No assertions means "didn't crash, did dump"
//! * everything is sequential; one ROM, one child process, one dump at a time
//!
//! Model
//!
//! ```text
//! gen_roms
//!  `-- suite::FIXTURES --> rom::Rom --> fixtures/*.rom + disasm/*.txt
//!                              `-- disasm (listing) --- instruction (fields)
//!
//! chip8-harness
//!  |-- config (dirs, VM path, timeout)
//!  `-- runner::Session
//!       |-- purge dumps
//!       `-- for each ROM, sorted:
//!            |-- Vm::run             exit != 0 / timeout  -> fail, no dump read
//!            |-- dump::read_dump     missing / short      -> fail
//!            `-- check::check        mismatches           -> fail, all listed
//! ```
pub mod check;
pub mod config;
pub mod disasm;
pub mod dump;
pub mod error;
pub mod instruction;
pub mod memory;
pub mod rom;
pub mod runner;
pub mod suite;

pub use check::{check, Expect, ExpectedState, Mismatch};
pub use dump::{compare_memory, read_dump, Chip8Dump};
pub use error::HarnessError;
pub use instruction::Instruction;
pub use rom::{Epilogue, Rom};
pub use runner::{Outcome, ProcessVm, Session, Summary, Vm};
