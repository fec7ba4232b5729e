use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::error;

use chip8_harness::config::{
    HarnessConfig, DEFAULT_DUMP_DIR, DEFAULT_FIXTURES_DIR, DEFAULT_VM,
};
use chip8_harness::error::HarnessError;
use chip8_harness::runner::{ProcessVm, Session};

#[derive(Parser, Debug)]
#[command(name = "chip8-harness", about = "CHIP-8 VM conformance tests")]
struct Cli {
    /// Run only this ROM (e.g. ld_vx or ld_vx.rom); default is every ROM in the fixtures dir
    rom: Option<String>,
    /// VM executable, run as `<vm> <rom> --test`
    #[arg(long, env = "CHIP8_VM", default_value = DEFAULT_VM)]
    vm: PathBuf,
    /// Directory holding the generated .rom fixtures
    #[arg(long, env = "CHIP8_FIXTURES", default_value = DEFAULT_FIXTURES_DIR)]
    fixtures: PathBuf,
    /// Directory the VM writes its dumps into; emptied before every run
    #[arg(long, env = "CHIP8_DUMPS", default_value = DEFAULT_DUMP_DIR)]
    dumps: PathBuf,
    /// Kill the VM if a single ROM takes longer than this; default is to wait forever
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Plain [PASS]/[FAIL] tags
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    env_logger::init();
    let args = Cli::parse();

    let config = HarnessConfig {
        vm_path: args.vm,
        fixtures_dir: args.fixtures,
        dump_dir: args.dumps,
        timeout: args.timeout_ms.map(Duration::from_millis),
        color: !args.no_color,
    };
    let mut vm = ProcessVm::new(&config);
    let mut stdout = io::stdout();
    let mut session = Session::new(config, &mut vm, &mut stdout);

    let roms = match session.resolve_selection(args.rom.as_deref()) {
        Ok(roms) => roms,
        Err(e @ HarnessError::UnknownRom(_)) => {
            println!("[ERROR] {}.", e);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let summary = session.run(&roms)?;
    Ok(ExitCode::from(summary.exit_code()))
}
