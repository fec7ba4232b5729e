//! # disasm
//!
//! Renders an opcode as its canonical mnemonic. Only used for listings and
//! diagnostics; the conformance check never reads its output.
//!
//! Matching is first-hit over a table ordered by specificity:
//!
//!  1. exact 16-bit encodings (`CLS`, `RET`)
//!  2. opcode class alone (top nibble)
//!  3. opcode class + low byte (the `Ex..` and `Fx..` families)
//!  4. opcode class + low nibble (`5xy0`, `9xy0`, the `8xyN` ALU family)
//!
//! Tiers 3 and 4 share no opcode class with each other or with tier 2, so
//! their relative order only matters against tiers 1 and 2. Note that `x`
//! sits inside the tier 3 mask's hole: `F155` is `Fx55` with `x = 1`, never
//! a separate encoding.
use crate::instruction::Instruction;

/// what anything outside the table renders as
pub const UNKNOWN: &str = "UNKNOWN";

const EXACT: u16 = 0xFFFF;
const CLASS: u16 = 0xF000;
const CLASS_BYTE: u16 = 0xF0FF;
const CLASS_NIBBLE: u16 = 0xF00F;

struct Pattern {
    mask: u16,
    bits: u16,
    render: fn(Instruction) -> String,
}

impl Pattern {
    fn matches(&self, op: Instruction) -> bool {
        op.0 & self.mask == self.bits
    }
}

#[rustfmt::skip]
static PATTERNS: &[Pattern] = &[
    Pattern { mask: EXACT, bits: 0x00E0, render: |_| "CLS".to_string() },
    Pattern { mask: EXACT, bits: 0x00EE, render: |_| "RET".to_string() },

    Pattern { mask: CLASS, bits: 0x0000, render: |i| format!("SYS 0x{:03X}", i.nnn()) },
    Pattern { mask: CLASS, bits: 0x1000, render: |i| format!("JP 0x{:03X}", i.nnn()) },
    Pattern { mask: CLASS, bits: 0x2000, render: |i| format!("CALL 0x{:03X}", i.nnn()) },
    Pattern { mask: CLASS, bits: 0x3000, render: |i| format!("SE V{:X}, 0x{:02X}", i.x(), i.kk()) },
    Pattern { mask: CLASS, bits: 0x4000, render: |i| format!("SNE V{:X}, 0x{:02X}", i.x(), i.kk()) },
    Pattern { mask: CLASS, bits: 0x6000, render: |i| format!("LD V{:X}, 0x{:02X}", i.x(), i.kk()) },
    Pattern { mask: CLASS, bits: 0x7000, render: |i| format!("ADD V{:X}, 0x{:02X}", i.x(), i.kk()) },
    Pattern { mask: CLASS, bits: 0xA000, render: |i| format!("LD I, 0x{:03X}", i.nnn()) },
    Pattern { mask: CLASS, bits: 0xB000, render: |i| format!("JP V0, 0x{:03X}", i.nnn()) },
    Pattern { mask: CLASS, bits: 0xC000, render: |i| format!("RND V{:X}, 0x{:02X}", i.x(), i.kk()) },
    Pattern { mask: CLASS, bits: 0xD000, render: |i| format!("DRW V{:X}, V{:X}, 0x{:X}", i.x(), i.y(), i.n()) },

    Pattern { mask: CLASS_BYTE, bits: 0xE09E, render: |i| format!("SKP V{:X}", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xE0A1, render: |i| format!("SKNP V{:X}", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xF007, render: |i| format!("LD V{:X}, DT", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xF00A, render: |i| format!("LD V{:X}, K", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xF015, render: |i| format!("LD DT, V{:X}", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xF018, render: |i| format!("LD ST, V{:X}", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xF01E, render: |i| format!("ADD I, V{:X}", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xF029, render: |i| format!("LD F, V{:X}", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xF033, render: |i| format!("LD B, V{:X}", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xF055, render: |i| format!("LD [I], V{:X}", i.x()) },
    Pattern { mask: CLASS_BYTE, bits: 0xF065, render: |i| format!("LD V{:X}, [I]", i.x()) },

    Pattern { mask: CLASS_NIBBLE, bits: 0x5000, render: |i| format!("SE V{:X}, V{:X}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x8000, render: |i| format!("LD V{:X}, V{:X}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x8001, render: |i| format!("OR V{:X}, V{:X}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x8002, render: |i| format!("AND V{:X}, V{:X}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x8003, render: |i| format!("XOR V{:X}, V{:X}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x8004, render: |i| format!("ADD V{:X}, V{:X}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x8005, render: |i| format!("SUB V{:X}, V{:X}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x8006, render: |i| format!("SHR V{:X} {{, V{:X}}}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x8007, render: |i| format!("SUBN V{:X}, V{:X}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x800E, render: |i| format!("SHL V{:X} {{, V{:X}}}", i.x(), i.y()) },
    Pattern { mask: CLASS_NIBBLE, bits: 0x9000, render: |i| format!("SNE V{:X}, V{:X}", i.x(), i.y()) },
];

/// mnemonic for a recognised opcode, None otherwise
pub fn lookup(op: Instruction) -> Option<String> {
    PATTERNS
        .iter()
        .find(|p| p.matches(op))
        .map(|p| (p.render)(op))
}

/// mnemonic for any opcode; unrecognised ones render as `UNKNOWN`
pub fn disassemble(op: Instruction) -> String {
    lookup(op).unwrap_or_else(|| UNKNOWN.to_string())
}
