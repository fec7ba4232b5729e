//! # runner
//!
//! Runs ROMs through the VM one at a time and judges the dumps they leave.
//! Whatever goes wrong with a single ROM becomes that ROM's `Outcome`; the
//! session always carries on to the next one.
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use crossterm::style::{style, Color, Stylize};
use log::{debug, info, warn};

use crate::check::{check, Mismatch};
use crate::config::{HarnessConfig, ROM_EXTENSION};
use crate::dump::read_dump;
use crate::error::{HarnessError, Result};
use crate::suite;

/// tells the VM to run to completion and dump instead of playing
pub const TEST_FLAG: &str = "--test";

/// how often a bounded wait checks on the child
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// how a VM run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmExit {
    /// exit code; None if killed by a signal
    Exited(Option<i32>),
    TimedOut(Duration),
}

/// the VM under test. The harness never looks inside it, it only runs it
/// and reads the dump it leaves.
pub trait Vm {
    /// run `rom` in test mode and wait for it
    fn run(&mut self, rom: &Path) -> Result<VmExit>;

    /// how the run looks on a command line, for the report
    fn command_line(&self, rom: &Path) -> String;
}

/// the real thing: `<vm> <rom> --test` as a child process
pub struct ProcessVm {
    path: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessVm {
    pub fn new(config: &HarnessConfig) -> Self {
        ProcessVm {
            path: config.vm_path.clone(),
            timeout: config.timeout,
        }
    }

    fn wait_bounded(child: &mut std::process::Child, limit: Duration) -> Result<VmExit> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(VmExit::Exited(status.code()));
            }
            if start.elapsed() >= limit {
                // may already have exited between try_wait and here
                let _ = child.kill();
                child.wait()?;
                return Ok(VmExit::TimedOut(limit));
            }
            spin_sleep::sleep(POLL_INTERVAL);
        }
    }
}

impl Vm for ProcessVm {
    fn run(&mut self, rom: &Path) -> Result<VmExit> {
        let mut child = Command::new(&self.path)
            .arg(rom)
            .arg(TEST_FLAG)
            .spawn()
            .map_err(|source| HarnessError::Launch {
                path: self.path.clone(),
                source,
            })?;
        debug!("spawned {} as pid {}", self.path.display(), child.id());
        match self.timeout {
            None => Ok(VmExit::Exited(child.wait()?.code())),
            Some(limit) => Self::wait_bounded(&mut child, limit),
        }
    }

    fn command_line(&self, rom: &Path) -> String {
        format!(
            "\"{}\" \"{}\" {}",
            self.path.display(),
            rom.display(),
            TEST_FLAG
        )
    }
}

/// verdict for one ROM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// nonzero exit; None if killed by a signal
    ExitStatus(Option<i32>),
    LaunchFailed(String),
    /// launched, but waiting on it failed
    RunFailed(String),
    TimedOut(Duration),
    MissingDump(PathBuf),
    BadDump(String),
    Mismatch(Vec<Mismatch>),
}

impl Outcome {
    pub fn passed(&self) -> bool {
        *self == Outcome::Passed
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::ExitStatus(Some(code)) => write!(f, "Emulator exited with code {}", code),
            Outcome::ExitStatus(None) => write!(f, "Emulator was terminated by a signal"),
            Outcome::LaunchFailed(why) => write!(f, "Could not launch emulator: {}", why),
            Outcome::RunFailed(why) => write!(f, "Lost track of emulator: {}", why),
            Outcome::TimedOut(limit) => {
                write!(f, "Emulator still running after {}ms, killed", limit.as_millis())
            }
            Outcome::MissingDump(path) => write!(f, "Missing dump file: {}", path.display()),
            Outcome::BadDump(why) => write!(f, "Unreadable dump file: {}", why),
            Outcome::Mismatch(m) => write!(f, "{} field(s) differ", m.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub rom: String,
    pub outcome: Outcome,
}

/// counts only; details went to the console as they happened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn record(&mut self, result: &TestResult) {
        if result.outcome.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

/// one pass over a set of ROMs
pub struct Session<'a> {
    config: HarnessConfig,
    vm: &'a mut dyn Vm,
    out: &'a mut dyn Write,
}

impl<'a> Session<'a> {
    pub fn new(config: HarnessConfig, vm: &'a mut dyn Vm, out: &'a mut dyn Write) -> Self {
        Session { config, vm, out }
    }

    /// a named ROM (extension optional), or every ROM in the fixtures dir
    /// sorted by name
    pub fn resolve_selection(&self, name: Option<&str>) -> Result<Vec<String>> {
        match name {
            Some(name) => {
                let rom = if Path::new(name).extension().map_or(false, |e| e == ROM_EXTENSION) {
                    name.to_string()
                } else {
                    format!("{}.{}", name, ROM_EXTENSION)
                };
                if !self.config.rom_path(&rom).is_file() {
                    return Err(HarnessError::UnknownRom(rom));
                }
                Ok(vec![rom])
            }
            None => {
                let mut roms = Vec::new();
                for entry in fs::read_dir(&self.config.fixtures_dir)? {
                    let path = entry?.path();
                    if path.is_file() && path.extension().map_or(false, |e| e == ROM_EXTENSION) {
                        if let Some(file) = path.file_name().and_then(|f| f.to_str()) {
                            roms.push(file.to_string());
                        }
                    }
                }
                roms.sort();
                Ok(roms)
            }
        }
    }

    /// clear out old dumps, then run every ROM in order
    pub fn run(&mut self, roms: &[String]) -> Result<Summary> {
        self.config.prepare_dump_dir()?;
        info!("running {} ROM(s) against {}", roms.len(), self.config.vm_path.display());
        let mut summary = Summary::default();
        for rom in roms {
            let result = self.run_single(rom)?;
            summary.record(&result);
        }
        writeln!(self.out, "---------------------------------")?;
        writeln!(
            self.out,
            "Results: {} Passed / {} Failed.",
            summary.passed, summary.failed
        )?;
        info!("{} passed, {} failed", summary.passed, summary.failed);
        Ok(summary)
    }

    /// run one ROM and report on it; only console I/O errors escape
    pub fn run_single(&mut self, rom: &str) -> io::Result<TestResult> {
        let rom_path = self.config.rom_path(rom);
        writeln!(self.out, "[TEST] {}", rom)?;
        writeln!(self.out, "CMD: {}", self.vm.command_line(&rom_path))?;

        let outcome = self.judge(rom, &rom_path);
        let (pass, fail) = (self.tag("[PASS]", Color::Green), self.tag("[FAIL]", Color::Red));
        match &outcome {
            Outcome::Passed => {}
            Outcome::Mismatch(mismatches) => {
                for m in mismatches {
                    writeln!(self.out, "  {} {}", fail, m)?;
                }
            }
            other => writeln!(self.out, "  {} {}", fail, other)?,
        }
        if outcome.passed() {
            writeln!(self.out, "  {} {} passed.\n", pass, rom)?;
        } else {
            warn!("{}: {}", rom, outcome);
            writeln!(self.out, "  {} {} failed.\n", fail, rom)?;
        }
        Ok(TestResult {
            rom: rom.to_string(),
            outcome,
        })
    }

    fn judge(&mut self, rom: &str, rom_path: &Path) -> Outcome {
        match self.vm.run(rom_path) {
            Ok(VmExit::Exited(Some(0))) => {}
            Ok(VmExit::Exited(code)) => return Outcome::ExitStatus(code),
            Ok(VmExit::TimedOut(limit)) => return Outcome::TimedOut(limit),
            Err(e @ HarnessError::Launch { .. }) => return Outcome::LaunchFailed(e.to_string()),
            Err(e) => return Outcome::RunFailed(e.to_string()),
        }
        let dump = match read_dump(&self.config.dump_path(rom)) {
            Ok(dump) => dump,
            Err(HarnessError::DumpNotFound(path)) => return Outcome::MissingDump(path),
            Err(e) => return Outcome::BadDump(e.to_string()),
        };
        let mismatches = check(&dump, &suite::expected_for(rom));
        if mismatches.is_empty() {
            Outcome::Passed
        } else {
            Outcome::Mismatch(mismatches)
        }
    }

    fn tag(&self, label: &str, color: Color) -> String {
        if self.config.color {
            style(label).with(color).to_string()
        } else {
            label.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Key;
    use crate::dump::Chip8Dump;
    use crate::memory::MemoryMap;

    /// stands in for the VM: writes a canned dump where the real one would
    struct DummyVm {
        dump_dir: PathBuf,
        exit: VmExit,
        dump: Option<Chip8Dump>,
        runs: Vec<PathBuf>,
    }

    impl DummyVm {
        fn new(config: &HarnessConfig, exit: VmExit, dump: Option<Chip8Dump>) -> Self {
            DummyVm {
                dump_dir: config.dump_dir.clone(),
                exit,
                dump,
                runs: Vec::new(),
            }
        }
    }

    impl Vm for DummyVm {
        fn run(&mut self, rom: &Path) -> Result<VmExit> {
            self.runs.push(rom.to_path_buf());
            if let Some(dump) = &self.dump {
                fs::create_dir_all(&self.dump_dir)?;
                let stem = rom.file_stem().unwrap_or_default();
                let path = self.dump_dir.join(stem).with_extension("bin");
                fs::write(path, dump.to_bytes())?;
            }
            Ok(self.exit)
        }

        fn command_line(&self, rom: &Path) -> String {
            format!("dummy {}", rom.display())
        }
    }

    /// fails before any dump could exist
    struct BrokenVm {
        launched: bool,
    }

    impl Vm for BrokenVm {
        fn run(&mut self, _rom: &Path) -> Result<VmExit> {
            let source = io::Error::new(io::ErrorKind::Other, "wait failed");
            if self.launched {
                Err(HarnessError::Io(source))
            } else {
                Err(HarnessError::Launch {
                    path: PathBuf::from("chip8"),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
                })
            }
        }

        fn command_line(&self, rom: &Path) -> String {
            format!("broken {}", rom.display())
        }
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        config: HarnessConfig,
    }

    fn setup(roms: &[&str]) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let config = HarnessConfig {
            fixtures_dir: tmp.path().join("fixtures"),
            dump_dir: tmp.path().join("dumps"),
            color: false,
            ..HarnessConfig::default()
        };
        fs::create_dir_all(&config.fixtures_dir).unwrap();
        for rom in roms {
            fs::write(config.rom_path(rom), [0x00, 0xEE]).unwrap();
        }
        Fixture { _tmp: tmp, config }
    }

    fn dump_v0(value: u8) -> Chip8Dump {
        let mut d = Chip8Dump::blank();
        d.v[0] = value;
        d
    }

    fn run(fx: &Fixture, vm: &mut DummyVm, roms: &[&str]) -> (Summary, String) {
        let mut out = Vec::new();
        let roms: Vec<String> = roms.iter().map(|r| r.to_string()).collect();
        let summary = Session::new(fx.config.clone(), vm, &mut out)
            .run(&roms)
            .unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_register_scenario_passes() {
        let fx = setup(&["ld_vx.rom"]);
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), Some(dump_v0(0x0A)));
        let (summary, out) = run(&fx, &mut vm, &["ld_vx.rom"]);
        assert_eq!(summary, Summary { passed: 1, failed: 0 });
        assert_eq!(summary.exit_code(), 0);
        assert!(out.contains("[PASS] ld_vx.rom passed."));
        assert!(out.contains("Results: 1 Passed / 0 Failed."));
    }

    #[test]
    fn test_mismatch_reported_per_key() {
        let fx = setup(&["mem_store_load.rom"]);
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), Some(dump_v0(0x0A)));
        let mut out = Vec::new();
        let result = Session::new(fx.config.clone(), &mut vm, &mut out)
            .run_single("mem_store_load.rom")
            .unwrap();
        assert_eq!(
            result.outcome,
            Outcome::Mismatch(vec![Mismatch {
                key: Key::Register(1),
                actual: 0,
                expected: 0x14
            }])
        );
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("[FAIL] V1 = 00, expected 14"));
        assert!(out.contains("[FAIL] mem_store_load.rom failed."));
    }

    #[test]
    fn test_bcd_scenario() {
        let fx = setup(&["bcd.rom"]);
        let mut d = Chip8Dump::blank();
        d.memory.write(&[0, 1, 5], 0x300).unwrap();
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), Some(d));
        let (summary, _) = run(&fx, &mut vm, &["bcd.rom"]);
        assert!(summary.all_passed());
    }

    #[test]
    fn test_empty_expectation_passes_on_any_state() {
        let fx = setup(&["cls.rom"]);
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), Some(dump_v0(0xFF)));
        let (summary, _) = run(&fx, &mut vm, &["cls.rom"]);
        assert_eq!(summary.passed, 1);
    }

    #[test]
    fn test_nonzero_exit_skips_dump() {
        let fx = setup(&["ld_vx.rom"]);
        // a perfectly good dump is written but must not be trusted
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(3)), Some(dump_v0(0x0A)));
        let mut out = Vec::new();
        let result = Session::new(fx.config.clone(), &mut vm, &mut out)
            .run_single("ld_vx.rom")
            .unwrap();
        assert_eq!(result.outcome, Outcome::ExitStatus(Some(3)));
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("[FAIL] Emulator exited with code 3"));
    }

    #[test]
    fn test_dummy_creates_dump_dir() {
        let fx = setup(&["ld_vx.rom"]);
        assert!(!fx.config.dump_dir.exists());
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), Some(dump_v0(0x0A)));
        let mut out = Vec::new();
        let result = Session::new(fx.config.clone(), &mut vm, &mut out)
            .run_single("ld_vx.rom")
            .unwrap();
        assert_eq!(result.outcome, Outcome::Passed);
        assert!(fx.config.dump_path("ld_vx.rom").is_file());
    }

    #[test]
    fn test_launch_and_run_errors_are_distinct() {
        let fx = setup(&["ld_vx.rom"]);
        let mut out = Vec::new();

        let mut vm = BrokenVm { launched: false };
        let result = Session::new(fx.config.clone(), &mut vm, &mut out)
            .run_single("ld_vx.rom")
            .unwrap();
        assert!(matches!(result.outcome, Outcome::LaunchFailed(_)));

        let mut vm = BrokenVm { launched: true };
        let result = Session::new(fx.config.clone(), &mut vm, &mut out)
            .run_single("ld_vx.rom")
            .unwrap();
        assert_eq!(
            result.outcome,
            Outcome::RunFailed("io error: wait failed".to_string())
        );

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("Could not launch emulator").count(), 1);
        assert!(out.contains("[FAIL] Lost track of emulator: io error: wait failed"));
    }

    #[test]
    fn test_missing_dump_is_distinct() {
        let fx = setup(&["ld_vx.rom"]);
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), None);
        let mut out = Vec::new();
        let result = Session::new(fx.config.clone(), &mut vm, &mut out)
            .run_single("ld_vx.rom")
            .unwrap();
        assert_eq!(
            result.outcome,
            Outcome::MissingDump(fx.config.dump_path("ld_vx.rom"))
        );
    }

    #[test]
    fn test_timeout_and_signal_fail() {
        let fx = setup(&["a.rom", "b.rom"]);
        let mut vm = DummyVm::new(&fx.config, VmExit::TimedOut(Duration::from_millis(50)), None);
        let (summary, out) = run(&fx, &mut vm, &["a.rom"]);
        assert_eq!(summary.failed, 1);
        assert!(out.contains("still running after 50ms"));

        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(None), None);
        let (summary, _) = run(&fx, &mut vm, &["b.rom"]);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_stale_dumps_purged() {
        let fx = setup(&["ld_vx.rom"]);
        fx.config.prepare_dump_dir().unwrap();
        fs::write(fx.config.dump_path("ld_vx.rom"), dump_v0(0x0A).to_bytes()).unwrap();
        // VM "succeeds" without writing anything; the old dump must not count
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), None);
        let (summary, out) = run(&fx, &mut vm, &["ld_vx.rom"]);
        assert_eq!(summary.failed, 1);
        assert!(out.contains("Missing dump file"));
    }

    #[test]
    fn test_failures_do_not_stop_session() {
        let fx = setup(&["add_vx.rom", "ld_vx.rom"]);
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), Some(dump_v0(0x0A)));
        let (summary, out) = run(&fx, &mut vm, &["add_vx.rom", "ld_vx.rom"]);
        assert_eq!(summary, Summary { passed: 1, failed: 1 });
        assert_eq!(vm.runs.len(), 2);
        assert!(out.contains("Results: 1 Passed / 1 Failed."));
    }

    #[test]
    fn test_selection_all_sorted() {
        let fx = setup(&["jump.rom", "add_vx.rom", "bcd.rom"]);
        fs::write(fx.config.fixtures_dir.join("notes.txt"), "x").unwrap();
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), None);
        let mut out = Vec::new();
        let session = Session::new(fx.config.clone(), &mut vm, &mut out);
        assert_eq!(
            session.resolve_selection(None).unwrap(),
            vec!["add_vx.rom", "bcd.rom", "jump.rom"]
        );
    }

    #[test]
    fn test_selection_by_name() {
        let fx = setup(&["jump.rom"]);
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), None);
        let mut out = Vec::new();
        let session = Session::new(fx.config.clone(), &mut vm, &mut out);
        assert_eq!(session.resolve_selection(Some("jump")).unwrap(), vec!["jump.rom"]);
        assert_eq!(session.resolve_selection(Some("jump.rom")).unwrap(), vec!["jump.rom"]);
    }

    #[test]
    fn test_unknown_rom_runs_nothing() {
        let fx = setup(&["jump.rom"]);
        let mut vm = DummyVm::new(&fx.config, VmExit::Exited(Some(0)), None);
        let mut out = Vec::new();
        let session = Session::new(fx.config.clone(), &mut vm, &mut out);
        match session.resolve_selection(Some("nope")) {
            Err(HarnessError::UnknownRom(name)) => assert_eq!(name, "nope.rom"),
            other => panic!("expected UnknownRom, got {:?}", other),
        }
        drop(session);
        assert!(vm.runs.is_empty());
    }

    #[test]
    fn test_colour_tags() {
        let fx = setup(&["ld_vx.rom"]);
        let mut config = fx.config.clone();
        config.color = true;
        let mut vm = DummyVm::new(&config, VmExit::Exited(Some(0)), Some(dump_v0(0x0A)));
        let mut out = Vec::new();
        Session::new(config, &mut vm, &mut out)
            .run_single("ld_vx.rom")
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("\x1b["));
        assert!(out.contains("ld_vx.rom passed."));
    }
}
