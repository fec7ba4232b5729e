//! Regenerates the test ROMs and their listings. Run once after changing
//! the fixture catalog:
//!
//!     cargo run --bin gen_roms
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use chip8_harness::config::{GeneratorConfig, DEFAULT_DISASM_DIR, DEFAULT_FIXTURES_DIR};
use chip8_harness::suite::FIXTURES;

#[derive(Parser, Debug)]
#[command(name = "gen_roms", about = "Generate CHIP-8 conformance test ROMs")]
struct Cli {
    /// Where the binary .rom files go
    #[arg(long, env = "CHIP8_FIXTURES", default_value = DEFAULT_FIXTURES_DIR)]
    fixtures: PathBuf,
    /// Where the .txt disassembly listings go
    #[arg(long, default_value = DEFAULT_DISASM_DIR)]
    disasm: PathBuf,
    /// Generate only these ROMs (by file name); default is all of them
    only: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Cli::parse();

    let config = GeneratorConfig {
        fixtures_dir: args.fixtures,
        disasm_dir: args.disasm,
    };
    config.prepare()?;

    let mut count = 0;
    for fixture in FIXTURES
        .iter()
        .filter(|f| args.only.is_empty() || args.only.iter().any(|o| o == f.name))
    {
        fixture.rom().write(&config)?;
        println!("[Generated] {}", fixture.name);
        count += 1;
    }
    info!(
        "{} ROM(s) in {}, listings in {}",
        count,
        config.fixtures_dir.display(),
        config.disasm_dir.display()
    );
    Ok(())
}
