//! The `chip8-harness` binary itself, for the paths that end before any VM runs.
use std::fs;
use std::process::Command;

const HARNESS: &str = env!("CARGO_BIN_EXE_chip8-harness");

#[test]
fn unknown_rom_exits_1_and_purges_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let fixtures = tmp.path().join("fixtures");
    let dumps = tmp.path().join("dumps");
    fs::create_dir_all(&fixtures).unwrap();
    fs::create_dir_all(&dumps).unwrap();
    fs::write(fixtures.join("ld_vx.rom"), [0x00, 0xEE]).unwrap();
    let stale = dumps.join("ld_vx.bin");
    fs::write(&stale, [0u8; 4]).unwrap();

    let output = Command::new(HARNESS)
        .arg("bogus")
        .arg("--vm")
        .arg(tmp.path().join("no-such-vm"))
        .arg("--fixtures")
        .arg(&fixtures)
        .arg("--dumps")
        .arg(&dumps)
        .arg("--no-color")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("[ERROR] ROM 'bogus.rom' not found."), "{}", stdout);
    assert!(!stdout.contains("[TEST]"));
    assert!(!stdout.contains("Results:"));
    assert!(stale.is_file());
}
