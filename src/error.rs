use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("dump not found: {}", .0.display())]
    DumpNotFound(PathBuf),
    #[error("dump is {len} bytes, need at least {need}")]
    DumpTooShort { len: usize, need: usize },
    #[error("ROM '{0}' not found")]
    UnknownRom(String),
    #[error("failed to launch {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("listing line {line} at {addr:#06x}: binary decodes to '{binary}', listing says '{listing}'")]
    ListingMismatch {
        line: usize,
        addr: u16,
        binary: String,
        listing: String,
    },
}
