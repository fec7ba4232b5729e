//! # dump
//!
//! Post-run snapshot of VM state. The layout is fixed by the VM, not
//! discoverable from the file:
//!
//! ```text
//!   0x0000-0x0fff  memory           4096 x u8
//!   0x1000-0x100f  V0-VF              16 x u8
//!   0x1010-0x1011  I                  u16 little-endian
//!   0x1012-0x1013  PC                 u16 little-endian
//!   0x1014         delay timer        u8
//!   0x1015         sound timer        u8
//! ```
//!
//! Little-endian here is the VM's native struct layout; it has nothing to do
//! with the big-endian instruction words inside `memory`.
//!
//! Anything after 0x1015 is ignored. The VM may write its whole state struct.
use std::fmt;
use std::fs;
use std::io;
use std::io::Read;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::debug;

use crate::error::{HarnessError, Result};
use crate::memory::{MemoryImage, CHIP8_RAM_SIZE_BYTES};

pub const REGISTERS_OFFSET: usize = 0x1000;
pub const I_OFFSET: usize = 0x1010;
pub const PC_OFFSET: usize = 0x1012;
pub const DELAY_TIMER_OFFSET: usize = 0x1014;
pub const SOUND_TIMER_OFFSET: usize = 0x1015;
/// bytes needed to cover every field
pub const DUMP_LEN: usize = 0x1016;

pub const REGISTER_COUNT: usize = 16;

/// parsed dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip8Dump {
    pub memory: MemoryImage,
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
}

impl Chip8Dump {
    /// read the fixed layout from the front of `data`
    pub fn from_reader(data: &mut impl Read) -> io::Result<Self> {
        let mut memory = vec![0u8; CHIP8_RAM_SIZE_BYTES];
        data.read_exact(&mut memory)?;
        let mut v = [0u8; REGISTER_COUNT];
        data.read_exact(&mut v)?;
        Ok(Chip8Dump {
            // read_exact filled exactly 4K
            memory: MemoryImage::from_slice(&memory)
                .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidData))?,
            v,
            i: data.read_u16::<LittleEndian>()?,
            pc: data.read_u16::<LittleEndian>()?,
            delay_timer: data.read_u8()?,
            sound_timer: data.read_u8()?,
        })
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < DUMP_LEN {
            return Err(HarnessError::DumpTooShort {
                len: raw.len(),
                need: DUMP_LEN,
            });
        }
        let mut cursor = raw;
        Ok(Self::from_reader(&mut cursor)?)
    }

    /// the same layout the VM's test shim writes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(DUMP_LEN);
        out.extend_from_slice(self.memory.as_bytes());
        out.extend_from_slice(&self.v);
        let mut words = [0u8; 4];
        LittleEndian::write_u16(&mut words[..2], self.i);
        LittleEndian::write_u16(&mut words[2..], self.pc);
        out.extend_from_slice(&words);
        out.push(self.delay_timer);
        out.push(self.sound_timer);
        out
    }

    /// a dump of a freshly reset machine; handy for building expectations
    pub fn blank() -> Self {
        Chip8Dump {
            memory: MemoryImage::new(),
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: 0,
            delay_timer: 0,
            sound_timer: 0,
        }
    }
}

impl fmt::Display for Chip8Dump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, val) in self.v.iter().enumerate() {
            write!(f, "V{:X}={:02X} ", idx, val)?;
        }
        write!(
            f,
            "I={:04X} PC={:04X} DT={:02X} ST={:02X}",
            self.i, self.pc, self.delay_timer, self.sound_timer
        )
    }
}

/// load and parse the dump at `path`
pub fn read_dump(path: &Path) -> Result<Chip8Dump> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(HarnessError::DumpNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let dump = Chip8Dump::from_bytes(&raw)?;
    debug!("{}: {}", path.display(), dump);
    Ok(dump)
}

/// where two buffers first disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryDiff {
    Byte {
        offset: usize,
        actual: u8,
        expected: u8,
    },
    /// common prefix matches, lengths don't
    Length { actual: usize, expected: usize },
}

impl fmt::Display for MemoryDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryDiff::Byte {
                offset,
                actual,
                expected,
            } => write!(
                f,
                "Mismatch at byte {:04X}: actual={:02X}, expected={:02X}",
                offset, actual, expected
            ),
            MemoryDiff::Length { actual, expected } => write!(
                f,
                "Length mismatch: actual={} bytes, expected={} bytes",
                actual, expected
            ),
        }
    }
}

/// whole-buffer equality; on failure reports only the lowest differing offset
pub fn compare_memory(actual: &[u8], expected: &[u8]) -> std::result::Result<(), MemoryDiff> {
    if actual == expected {
        return Ok(());
    }
    let first = actual
        .iter()
        .zip(expected)
        .position(|(a, e)| a != e);
    let diff = match first {
        Some(offset) => MemoryDiff::Byte {
            offset,
            actual: actual[offset],
            expected: expected[offset],
        },
        None => MemoryDiff::Length {
            actual: actual.len(),
            expected: expected.len(),
        },
    };
    debug!("{}", diff);
    Err(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMap;

    fn sample() -> Vec<u8> {
        let mut raw = vec![0u8; DUMP_LEN];
        raw[0x300] = 0x01;
        raw[0x0fff] = 0xEE;
        raw[REGISTERS_OFFSET] = 0x0A;
        raw[REGISTERS_OFFSET + 0xF] = 0x01;
        raw[I_OFFSET..I_OFFSET + 2].copy_from_slice(&[0x00, 0x03]);
        raw[PC_OFFSET..PC_OFFSET + 2].copy_from_slice(&[0x0A, 0x02]);
        raw[DELAY_TIMER_OFFSET] = 0x1E;
        raw[SOUND_TIMER_OFFSET] = 0x1D;
        raw
    }

    #[test]
    fn test_fields_at_fixed_offsets() -> Result<()> {
        let d = Chip8Dump::from_bytes(&sample())?;
        assert_eq!(d.memory.get_byte(0x300), Some(0x01));
        assert_eq!(d.memory[0x0fff], 0xEE);
        assert_eq!(d.v[0], 0x0A);
        assert_eq!(d.v[0xF], 0x01);
        assert_eq!(d.delay_timer, 0x1E);
        assert_eq!(d.sound_timer, 0x1D);
        Ok(())
    }

    #[test]
    fn test_wide_fields_little_endian() -> Result<()> {
        let d = Chip8Dump::from_bytes(&sample())?;
        assert_eq!(d.i, 0x0300);
        assert_eq!(d.pc, 0x020A);
        Ok(())
    }

    #[test]
    fn test_parse_is_pure() -> Result<()> {
        let raw = sample();
        assert_eq!(Chip8Dump::from_bytes(&raw)?, Chip8Dump::from_bytes(&raw)?);
        Ok(())
    }

    #[test]
    fn test_trailing_bytes_ignored() -> Result<()> {
        let mut raw = sample();
        raw.extend_from_slice(&[0xFF; 2048]);
        assert_eq!(Chip8Dump::from_bytes(&raw)?, Chip8Dump::from_bytes(&sample())?);
        Ok(())
    }

    #[test]
    fn test_too_short() {
        let raw = sample();
        match Chip8Dump::from_bytes(&raw[..DUMP_LEN - 1]) {
            Err(HarnessError::DumpTooShort { len, need }) => {
                assert_eq!(len, DUMP_LEN - 1);
                assert_eq!(need, DUMP_LEN);
            }
            other => panic!("expected DumpTooShort, got {:?}", other),
        }
    }

    #[test]
    fn test_to_bytes_matches_layout() -> Result<()> {
        let raw = sample();
        assert_eq!(Chip8Dump::from_bytes(&raw)?.to_bytes(), raw);
        assert_eq!(Chip8Dump::blank().to_bytes().len(), DUMP_LEN);
        Ok(())
    }

    #[test]
    fn test_to_bytes_wide_fields() {
        let mut d = Chip8Dump::blank();
        d.i = 0x0300;
        d.pc = 0x020A;
        d.sound_timer = 0x1D;
        let raw = d.to_bytes();
        assert_eq!(raw[I_OFFSET..I_OFFSET + 2], [0x00, 0x03]);
        assert_eq!(raw[PC_OFFSET..PC_OFFSET + 2], [0x0A, 0x02]);
        assert_eq!(raw[SOUND_TIMER_OFFSET], 0x1D);
    }

    #[test]
    fn test_read_dump_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope.bin");
        match read_dump(&path) {
            Err(HarnessError::DumpNotFound(p)) => assert_eq!(p, path),
            other => panic!("expected DumpNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_read_dump_from_disk() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("ld_vx.bin");
        fs::write(&path, sample())?;
        assert_eq!(read_dump(&path)?.v[0], 0x0A);
        Ok(())
    }

    #[test]
    fn test_compare_memory_equal() {
        assert_eq!(compare_memory(&[1, 2, 3], &[1, 2, 3]), Ok(()));
        assert_eq!(compare_memory(&[], &[]), Ok(()));
    }

    #[test]
    fn test_compare_memory_reports_first_only() {
        let diff = compare_memory(&[1, 9, 3, 9], &[1, 2, 3, 4]).unwrap_err();
        assert_eq!(
            diff,
            MemoryDiff::Byte {
                offset: 1,
                actual: 9,
                expected: 2
            }
        );
        assert_eq!(diff.to_string(), "Mismatch at byte 0001: actual=09, expected=02");
    }

    #[test]
    fn test_compare_memory_length_only() {
        assert_eq!(
            compare_memory(&[1, 2], &[1, 2, 3]),
            Err(MemoryDiff::Length {
                actual: 2,
                expected: 3
            })
        );
    }
}
