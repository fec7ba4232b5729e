//! # check
//!
//! Per-ROM expectations and the comparison against a parsed dump. Every
//! assertion is evaluated; a ROM's mismatches are all collected before any
//! verdict.
use std::collections::BTreeMap;
use std::fmt;

use crate::dump::Chip8Dump;

/// one assertion key and its expected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    /// Vx == value
    Register(u8, u8),
    /// memory[addr] == value for each listed address; not a region compare
    Memory(BTreeMap<u16, u8>),
    DelayTimer(u8),
    SoundTimer(u8),
}

/// what a single ROM should leave behind; empty means "ran and dumped" is enough
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedState(Vec<Expect>);

impl ExpectedState {
    pub fn new() -> Self {
        ExpectedState(Vec::new())
    }

    pub fn register(mut self, x: u8, value: u8) -> Self {
        self.0.push(Expect::Register(x, value));
        self
    }

    pub fn memory(mut self, cells: &[(u16, u8)]) -> Self {
        self.0.push(Expect::Memory(cells.iter().copied().collect()));
        self
    }

    pub fn delay_timer(mut self, value: u8) -> Self {
        self.0.push(Expect::DelayTimer(value));
        self
    }

    pub fn sound_timer(mut self, value: u8) -> Self {
        self.0.push(Expect::SoundTimer(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expect> {
        self.0.iter()
    }
}

/// which field disagreed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Register(u8),
    Memory(u16),
    DelayTimer,
    SoundTimer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub key: Key,
    pub actual: u8,
    pub expected: u8,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            Key::Register(x) => write!(f, "V{:X}", x)?,
            Key::Memory(addr) => write!(f, "Mem[{:04X}]", addr)?,
            Key::DelayTimer => write!(f, "Delay Timer")?,
            Key::SoundTimer => write!(f, "Sound Timer")?,
        }
        write!(f, " = {:02X}, expected {:02X}", self.actual, self.expected)
    }
}

fn compare(out: &mut Vec<Mismatch>, key: Key, actual: u8, expected: u8) {
    if actual != expected {
        out.push(Mismatch {
            key,
            actual,
            expected,
        });
    }
}

/// every assertion in `expected` that `dump` fails, in declaration order
pub fn check(dump: &Chip8Dump, expected: &ExpectedState) -> Vec<Mismatch> {
    let mut out = Vec::new();
    for assertion in expected.iter() {
        match assertion {
            Expect::Register(x, value) => {
                let x = *x & 0x0F;
                compare(&mut out, Key::Register(x), dump.v[x as usize], *value)
            }
            Expect::Memory(cells) => {
                for (addr, value) in cells {
                    // addresses wrap into the 4K space like the VM's own accesses
                    let addr = addr & 0x0FFF;
                    compare(&mut out, Key::Memory(addr), dump.memory[addr], *value);
                }
            }
            Expect::DelayTimer(value) => {
                compare(&mut out, Key::DelayTimer, dump.delay_timer, *value)
            }
            Expect::SoundTimer(value) => {
                compare(&mut out, Key::SoundTimer, dump.sound_timer, *value)
            }
        }
    }
    out
}
