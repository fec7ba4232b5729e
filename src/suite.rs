//! The built-in fixtures: what each ROM runs and what it must leave behind.
use crate::check::ExpectedState;
use crate::instruction::Instruction;
use crate::rom::{Epilogue, Rom};

pub struct Fixture {
    /// file name on disk, also the key expectations are looked up by
    pub name: &'static str,
    pub body: &'static [u16],
    pub epilogue: Epilogue,
    pub expected: fn() -> ExpectedState,
}

impl Fixture {
    pub fn rom(&self) -> Rom {
        let body: Vec<Instruction> = self.body.iter().copied().map(Instruction).collect();
        Rom::assemble(self.name, &body, self.epilogue)
    }
}

fn nothing() -> ExpectedState {
    ExpectedState::new()
}

#[rustfmt::skip]
pub static FIXTURES: &[Fixture] = &[
    Fixture {
        name: "ld_vx.rom",
        body: &[0x600A],
        epilogue: Epilogue::Return,
        expected: || ExpectedState::new().register(0x0, 0x0A),
    },
    Fixture {
        name: "add_vx.rom",
        body: &[0x6001, 0x7002],
        epilogue: Epilogue::Return,
        expected: || ExpectedState::new().register(0x0, 0x03),
    },
    Fixture {
        name: "mem_store_load.rom",
        body: &[
            0x600A, 0x6114, // V0, V1 = 0A, 14
            0xA300, 0xF155, // store V0-V1 at 0x300
            0x6000, 0x6100, // clobber
            0xA300, 0xF165, // load them back
        ],
        epilogue: Epilogue::Return,
        expected: || ExpectedState::new().register(0x0, 0x0A).register(0x1, 0x14),
    },
    Fixture {
        name: "jump.rom",
        // 0x208 JP 0x20C skips the LD V0, 1 at 0x20A
        body: &[0x120C, 0x6001, 0x6002, 0x600F],
        epilogue: Epilogue::Return,
        expected: || ExpectedState::new().register(0x0, 0x0F),
    },
    Fixture {
        name: "call_ret.rom",
        // nested CALL 0x20C whose target is the body's own trailing RET
        body: &[0x220C, 0x600B, 0x00EE],
        epilogue: Epilogue::SelfTerminating,
        expected: || ExpectedState::new().register(0x0, 0x0B),
    },
    Fixture {
        name: "cls.rom",
        body: &[0x00E0],
        epilogue: Epilogue::Return,
        expected: nothing,
    },
    Fixture {
        name: "draw_sprite.rom",
        body: &[0x6000, 0x6100, 0xA300, 0xD015],
        epilogue: Epilogue::Return,
        expected: nothing,
    },
    Fixture {
        name: "key_skip.rom",
        // no key is down in test mode, so nothing deterministic to assert
        body: &[0x6005, 0xE09E, 0x60FF],
        epilogue: Epilogue::Return,
        expected: nothing,
    },
    Fixture {
        name: "bcd.rom",
        body: &[0x600F, 0xA300, 0xF033],
        epilogue: Epilogue::Return,
        expected: || ExpectedState::new().memory(&[(0x300, 0), (0x301, 1), (0x302, 5)]),
    },
    Fixture {
        name: "timer_set.rom",
        // timers tick on wall-clock time, so their value at dump time isn't stable
        body: &[0x601E, 0xF015, 0xF018],
        epilogue: Epilogue::Return,
        expected: nothing,
    },
];

pub fn find(name: &str) -> Option<&'static Fixture> {
    FIXTURES.iter().find(|f| f.name == name)
}

/// expectations for a ROM on disk; ROMs we don't know about only have to run
pub fn expected_for(name: &str) -> ExpectedState {
    find(name).map(|f| (f.expected)()).unwrap_or_default()
}
