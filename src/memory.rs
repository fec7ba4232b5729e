use std::io;
use std::io::Read;

use crate::instruction::Instruction;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// a flat, byte-addressed view of CHIP-8 memory
pub trait MemoryMap {
    /// write unknown len of data into memory at a particular address
    fn write_any(&mut self, reader: &mut impl io::Read, addr: u16) -> Result<usize, io::Error> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        self.write(buf.as_slice(), addr)?;
        Ok(len)
    }

    /// write a chunk of bytes into memory; fails rather than running off the end
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), io::Error> {
        let bytes = self.get_rw_slice(addr, data.len()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} bytes at {:#05x} overrun memory", data.len(), addr),
            )
        })?;
        let mut d: &[u8] = data;
        d.read_exact(bytes)
    }

    /// get a two-byte word, big-endian as the chip-8 stores instructions
    fn get_word(&self, addr: u16) -> Option<u16> {
        let word = self.get_ro_slice(addr, 2)?;
        Some(Instruction::from_be_bytes([word[0], word[1]]).0)
    }

    /// get a single byte
    fn get_byte(&self, addr: u16) -> Option<u8> {
        self.get_ro_slice(addr, 1).map(|b| b[0])
    }

    /// get a r/w slice of the underlying memory, None if out of range
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Option<&mut [u8]>;

    /// get a r/o slice of the underlying memory, None if out of range
    fn get_ro_slice(&self, addr: u16, len: usize) -> Option<&[u8]>;
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// the full 4K CHIP-8 address space:
///   0x0000-0x01ff  interpreter (font lives at 0x050)
///   0x0200-0x0fff  program and data
#[derive(Clone, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: Box<[u8]>,
}

impl MemoryMap for MemoryImage {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Option<&mut [u8]> {
        let a = addr as usize;
        self.bytes.get_mut(a..a.checked_add(len)?)
    }
    fn get_ro_slice(&self, addr: u16, len: usize) -> Option<&[u8]> {
        let a = addr as usize;
        self.bytes.get(a..a.checked_add(len)?)
    }
}

impl MemoryImage {
    /// zeroed memory
    pub fn new() -> Self {
        MemoryImage {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
        }
    }

    /// memory as captured in a dump; `raw` must be exactly 4K
    pub fn from_slice(raw: &[u8]) -> Option<Self> {
        if raw.len() != CHIP8_RAM_SIZE_BYTES {
            return None;
        }
        Some(MemoryImage {
            bytes: Box::from(raw),
        })
    }

    /// load a CHIP-8 program at 0x200, returns its length
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, io::Error> {
        self.write_any(reader, CHIP8_PROGRAM_ADDR)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<u16> for MemoryImage {
    type Output = u8;

    fn index(&self, addr: u16) -> &u8 {
        &self.bytes[addr as usize]
    }
}

impl std::fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 4K of hex is noise in assertion failures
        let used = self.bytes.iter().filter(|b| **b != 0).count();
        write!(f, "MemoryImage {{ {} non-zero bytes }}", used)
    }
}
