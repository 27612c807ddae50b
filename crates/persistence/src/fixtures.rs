use crate::error::Result;
use crate::misc::MiscStore;

use rescue_core::config::RecoveryConfig;
use rescue_core::control_block::{BootControlBlock, BOOT_RECOVERY};
use std::fs;
use std::path::{Path, PathBuf};

/// Size of the generated misc image; the record sits at offset 0.
pub const MISC_IMAGE_LEN: usize = 16 * 1024;

pub struct TestPaths {
    pub misc: PathBuf,
    pub command_file: PathBuf,
    pub intent: PathBuf,
    pub script: PathBuf,
}

impl TestPaths {
    pub fn config(&self) -> RecoveryConfig {
        RecoveryConfig {
            control_block_path: self.misc.clone(),
            control_block_offset: 0,
            command_file: self.command_file.clone(),
            intent_file: self.intent.clone(),
            script_file: self.script.clone(),
            ..RecoveryConfig::default()
        }
    }
}

fn layout(dir: &Path) -> Result<TestPaths> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let recovery_dir = dir.join("cache/recovery");
    fs::create_dir_all(&recovery_dir)?;

    let misc = dir.join("misc.img");
    fs::write(&misc, vec![0u8; MISC_IMAGE_LEN])?;

    Ok(TestPaths {
        misc,
        command_file: recovery_dir.join("command"),
        intent: recovery_dir.join("intent"),
        script: dir.join("openrecoveryscript"),
    })
}

/// Zeroed misc image, no command file.
pub fn generate_empty_scenario(dir: &Path) -> Result<TestPaths> {
    layout(dir)
}

/// Misc image carrying `boot-recovery` and the given arguments, as left by
/// the OS when it requests a recovery session.
pub fn generate_boot_message_scenario(dir: &Path, args: &[&str]) -> Result<TestPaths> {
    let paths = layout(dir)?;

    let mut recovery = String::from("recovery\n");
    for arg in args {
        recovery.push_str(arg);
        recovery.push('\n');
    }
    let mut block = BootControlBlock::zeroed();
    block.set_command(BOOT_RECOVERY);
    block.set_recovery(&recovery);
    MiscStore::new(&paths.misc, 0).write(&block)?;

    Ok(paths)
}

/// Zeroed misc image plus a command file with one argument per line.
pub fn generate_command_file_scenario(dir: &Path, lines: &[&str]) -> Result<TestPaths> {
    let paths = layout(dir)?;

    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    fs::write(&paths.command_file, body)?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_file::CommandFile;
    use tempfile::tempdir;

    #[test]
    fn test_fixture_generator() {
        let dir = tempdir().unwrap();
        let paths = generate_boot_message_scenario(dir.path(), &["--wipe_data"]).unwrap();

        assert!(paths.misc.exists());
        assert!(!paths.command_file.exists());

        let block = MiscStore::new(&paths.misc, 0).read().unwrap();
        assert_eq!(block.command().as_text(), Some(BOOT_RECOVERY));
        assert_eq!(block.recovery().as_text(), Some("recovery\n--wipe_data\n"));

        let config = paths.config();
        assert_eq!(config.control_block_path, paths.misc);
        assert_eq!(config.max_args, RecoveryConfig::default().max_args);
    }

    #[test]
    fn test_command_file_fixture() {
        let dir = tempdir().unwrap();
        let paths = generate_command_file_scenario(dir.path(), &["--wipe_cache", "--nandroid"]).unwrap();

        let block = MiscStore::new(&paths.misc, 0).read().unwrap();
        assert!(block.is_zeroed());

        let lines = CommandFile::new(&paths.command_file).read(99, 4096).unwrap().unwrap();
        assert_eq!(lines, vec!["--wipe_cache", "--nandroid"]);
    }
}
