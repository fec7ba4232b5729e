//! Directory and process settings, passed explicitly to whoever needs them.
//! Nothing here touches the filesystem until one of the `prepare*` calls.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

/// where the external VM writes its dumps, relative to its working directory
pub const DEFAULT_DUMP_DIR: &str = "tests/python/dumps";
pub const DEFAULT_FIXTURES_DIR: &str = "tests/python/fixtures";
pub const DEFAULT_DISASM_DIR: &str = "tests/python/disasm";
pub const DEFAULT_VM: &str = if cfg!(windows) { "chip8.exe" } else { "./chip8" };

pub const ROM_EXTENSION: &str = "rom";
pub const DUMP_EXTENSION: &str = "bin";
pub const LISTING_EXTENSION: &str = "txt";

/// settings for a test session
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub vm_path: PathBuf,
    pub fixtures_dir: PathBuf,
    pub dump_dir: PathBuf,
    /// None waits for the VM forever
    pub timeout: Option<Duration>,
    pub color: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            vm_path: PathBuf::from(DEFAULT_VM),
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            dump_dir: PathBuf::from(DEFAULT_DUMP_DIR),
            timeout: None,
            color: true,
        }
    }
}

impl HarnessConfig {
    /// `<fixtures>/<rom>`; `rom` is a full filename
    pub fn rom_path(&self, rom: &str) -> PathBuf {
        self.fixtures_dir.join(rom)
    }

    /// `<dumps>/<stem>.bin`, the same name the VM derives from the ROM path
    pub fn dump_path(&self, rom: &str) -> PathBuf {
        self.dump_dir.join(Path::new(rom).with_extension(DUMP_EXTENSION))
    }

    /// make sure the dump directory exists and holds nothing from an earlier run
    pub fn prepare_dump_dir(&self) -> Result<(), io::Error> {
        fs::create_dir_all(&self.dump_dir)?;
        for entry in fs::read_dir(&self.dump_dir)? {
            let path = entry?.path();
            if path.is_file() {
                debug!("purging stale dump {}", path.display());
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// settings for the ROM generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub fixtures_dir: PathBuf,
    pub disasm_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            disasm_dir: PathBuf::from(DEFAULT_DISASM_DIR),
        }
    }
}

impl GeneratorConfig {
    pub fn rom_path(&self, rom: &str) -> PathBuf {
        self.fixtures_dir.join(rom)
    }

    /// `<disasm>/<stem>.txt`
    pub fn listing_path(&self, rom: &str) -> PathBuf {
        self.disasm_dir
            .join(Path::new(rom).with_extension(LISTING_EXTENSION))
    }

    pub fn prepare(&self) -> Result<(), io::Error> {
        fs::create_dir_all(&self.fixtures_dir)?;
        fs::create_dir_all(&self.disasm_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let c = HarnessConfig {
            fixtures_dir: PathBuf::from("fx"),
            dump_dir: PathBuf::from("dumps"),
            ..HarnessConfig::default()
        };
        assert_eq!(c.rom_path("bcd.rom"), Path::new("fx/bcd.rom"));
        assert_eq!(c.dump_path("bcd.rom"), Path::new("dumps/bcd.bin"));

        let g = GeneratorConfig {
            fixtures_dir: PathBuf::from("fx"),
            disasm_dir: PathBuf::from("dis"),
        };
        assert_eq!(g.listing_path("call_ret.rom"), Path::new("dis/call_ret.txt"));
    }

    #[test]
    fn test_prepare_dump_dir_purges() -> Result<(), io::Error> {
        let tmp = tempfile::tempdir()?;
        let c = HarnessConfig {
            dump_dir: tmp.path().join("dumps"),
            ..HarnessConfig::default()
        };
        c.prepare_dump_dir()?;
        fs::write(c.dump_path("stale.rom"), [0u8; 4])?;
        c.prepare_dump_dir()?;
        assert_eq!(fs::read_dir(&c.dump_dir)?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_no_timeout_by_default() {
        assert!(HarnessConfig::default().timeout.is_none());
    }
}
