//! # rom
//!
//! Wraps a test body so the VM can run it unattended in test mode:
//!
//! ```text
//!   0x200  CALL 0x208      every test exercises call/return
//!   0x202  LD VE, 0x00     filler up to the body
//!   0x204  LD VE, 0x00
//!   0x206  LD VE, 0x00
//!   0x208  <body>          always here, however long the preamble
//!   ....   RET             unless the body returns by itself
//! ```
//!
//! The first RET pops back to 0x202. The fillers then run and fall into the
//! body a second time, this time with nothing on the stack, so the next RET
//! is the one the VM treats as the end of the test: it dumps its state and
//! exits. The body therefore runs twice, and the fillers only touch VE, which
//! no body or expectation uses. A body that already ends in its own return
//! must not get a second one, or the stack pointer underflows before the
//! dump. That is a property of the fixture, declared with
//! `Epilogue::SelfTerminating`, never inferred from the body's last word.
use std::fmt;
use std::fs;
use std::str::FromStr;

use log::debug;

use crate::config::GeneratorConfig;
use crate::disasm::disassemble;
use crate::dump::compare_memory;
use crate::error::{HarnessError, Result};
use crate::instruction::Instruction;
use crate::memory::{MemoryImage, MemoryMap, CHIP8_PROGRAM_ADDR};

/// where the VM starts executing
pub const BASE_ADDR: u16 = CHIP8_PROGRAM_ADDR;
/// where every test body starts
pub const BODY_ADDR: u16 = 0x208;
/// no observable effect: VE is never touched by a test body or an expectation
pub const FILLER: Instruction = Instruction(0x6E00);

/// slot index of the first body instruction
pub const BODY_SLOT: usize = ((BODY_ADDR - BASE_ADDR) / 2) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Epilogue {
    /// append a RET after the body
    Return,
    /// the body unwinds the stack itself; append nothing
    SelfTerminating,
}

/// an assembled test ROM; immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    name: String,
    words: Vec<Instruction>,
}

impl Rom {
    pub fn assemble(name: impl Into<String>, body: &[Instruction], epilogue: Epilogue) -> Rom {
        let mut words = Vec::with_capacity(BODY_SLOT + body.len() + 1);
        words.push(Instruction::call(BODY_ADDR));
        words.resize(BODY_SLOT, FILLER);
        words.extend_from_slice(body);
        if epilogue == Epilogue::Return {
            words.push(Instruction::ret());
        }
        Rom {
            name: name.into(),
            words,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.words
    }

    /// the body and epilogue, i.e. everything from BODY_ADDR on
    pub fn body(&self) -> &[Instruction] {
        &self.words[BODY_SLOT..]
    }

    /// big-endian words, no header
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    pub fn listing(&self) -> Vec<ListingLine> {
        self.words
            .iter()
            .enumerate()
            .map(|(slot, op)| ListingLine::new(slot_addr(slot), *op))
            .collect()
    }

    pub fn render_listing(&self) -> String {
        self.listing()
            .iter()
            .map(|line| format!("{}\n", line))
            .collect()
    }

    /// write `<fixtures>/<name>` and `<disasm>/<stem>.txt`, then read both
    /// back and check they still agree
    pub fn write(&self, config: &GeneratorConfig) -> Result<()> {
        let rom_path = config.rom_path(&self.name);
        let listing_path = config.listing_path(&self.name);
        let bytes = self.to_bytes();
        fs::write(&rom_path, &bytes)?;
        fs::write(&listing_path, self.render_listing())?;

        let written = fs::read(&rom_path)?;
        if let Err(diff) = compare_memory(&written, &bytes) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{}: {}", rom_path.display(), diff),
            )
            .into());
        }
        verify_listing(&written, &fs::read_to_string(&listing_path)?)?;
        debug!("wrote {} and {}", rom_path.display(), listing_path.display());
        Ok(())
    }
}

fn slot_addr(slot: usize) -> u16 {
    BASE_ADDR + 2 * slot as u16
}

/// `AAAA: OOOO: MNEMONIC`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    pub addr: u16,
    pub op: Instruction,
    pub mnemonic: String,
}

impl ListingLine {
    pub fn new(addr: u16, op: Instruction) -> Self {
        ListingLine {
            addr,
            op,
            mnemonic: disassemble(op),
        }
    }
}

impl fmt::Display for ListingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}: {}: {}", self.addr, self.op, self.mnemonic)
    }
}

impl FromStr for ListingLine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ": ");
        let mut hex = |what: &str| {
            parts
                .next()
                .and_then(|p| u16::from_str_radix(p.trim(), 16).ok())
                .ok_or_else(|| format!("bad {} in listing line '{}'", what, s))
        };
        let addr = hex("address")?;
        let op = Instruction(hex("opcode")?);
        let mnemonic = parts
            .next()
            .ok_or_else(|| format!("no mnemonic in listing line '{}'", s))?
            .trim_end()
            .to_string();
        Ok(ListingLine { addr, op, mnemonic })
    }
}

/// load `binary` at the base address and check that decoding each word
/// gives back the listing, line for line
pub fn verify_listing(binary: &[u8], listing: &str) -> Result<()> {
    let mut memory = MemoryImage::new();
    let mut reader = binary;
    let len = memory.load_program(&mut reader)?;
    let slots = (len + 1) / 2;

    let lines: Vec<&str> = listing.lines().filter(|l| !l.trim().is_empty()).collect();
    for slot in 0..slots.max(lines.len()) {
        let addr = slot_addr(slot);
        let binary_text = if slot < slots {
            memory.get_word(addr).map(|w| disassemble(Instruction(w)))
        } else {
            None
        };
        let listed = match lines.get(slot) {
            Some(text) => Some(text.parse::<ListingLine>().map_err(|e| {
                HarnessError::ListingMismatch {
                    line: slot + 1,
                    addr,
                    binary: binary_text.clone().unwrap_or_default(),
                    listing: e,
                }
            })?),
            None => None,
        };
        let ok = match (&binary_text, &listed) {
            (Some(b), Some(l)) => l.addr == addr && *b == l.mnemonic,
            _ => false,
        };
        if !ok {
            return Err(HarnessError::ListingMismatch {
                line: slot + 1,
                addr,
                binary: binary_text.unwrap_or_else(|| "<end of ROM>".to_string()),
                listing: listed
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "<end of listing>".to_string()),
            });
        }
    }
    Ok(())
}
