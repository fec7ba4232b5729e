//! # instruction
//!
//! A CHIP-8 opcode is a big-endian 16-bit word. Everything else about it is a
//! view onto those bits:
//!
//! ```text
//!   15   12 11    8 7     4 3     0
//!  +-------+-------+-------+-------+
//!  | class |   x   |   y   |   n   |
//!  +-------+-------+-------+-------+
//!          |<-------- nnn -------->|
//!                  |<---- kk ----->|
//! ```
//!
//! Field extraction is total: every one of the 65536 values has all five
//! fields. Whether a value *means* anything is the disassembler's problem.
use std::fmt;

use byteorder::{BigEndian, ByteOrder};

/// one 16-bit CHIP-8 instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Instruction(pub u16);

impl Instruction {
    /// low 12 bits; an address
    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }

    /// low 8 bits; a byte literal
    pub fn kk(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// bits 8-11; a register index
    pub fn x(self) -> u8 {
        ((self.0 >> 8) & 0x0F) as u8
    }

    /// bits 4-7; a register index
    pub fn y(self) -> u8 {
        ((self.0 >> 4) & 0x0F) as u8
    }

    /// low 4 bits; a small literal
    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// top nibble, i.e. the opcode class
    pub fn class(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// serialise as it sits in CHIP-8 memory
    pub fn to_be_bytes(self) -> [u8; 2] {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, self.0);
        buf
    }

    /// inverse of `to_be_bytes`
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Instruction(BigEndian::read_u16(&bytes))
    }
}

impl From<u16> for Instruction {
    fn from(word: u16) -> Self {
        Instruction(word)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

// constructors for the handful of encodings the ROM assembler emits itself
impl Instruction {
    /// 2nnn
    pub fn call(addr: u16) -> Self {
        Instruction(0x2000 | (addr & 0x0FFF))
    }

    /// 00EE
    pub fn ret() -> Self {
        Instruction(0x00EE)
    }

    /// 6xkk
    pub fn load_literal(x: u8, kk: u8) -> Self {
        Instruction(0x6000 | (u16::from(x & 0x0F) << 8) | u16::from(kk))
    }
}
