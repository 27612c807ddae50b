//! Process-backed collaborators used by the `rescue` binary.

use rescue_core::pipeline::SdCardPartitioner;
use rescue_core::reboot::{RebootPrimitive, RebootTarget};
use rescue_core::RecoveryError;
use std::path::PathBuf;
use std::process::Command;

pub const DEFAULT_REBOOT_PROGRAM: &str = "reboot";

/// Arguments for the platform `reboot` tool.
pub fn reboot_args(target: RebootTarget) -> Vec<&'static str> {
    match target {
        RebootTarget::System => vec![],
        RebootTarget::Poweroff => vec!["-p"],
        other => vec![other.as_str()],
    }
}

/// Reboots by running the platform reboot tool, or only logs in dry-run mode.
pub struct CommandReboot {
    program: PathBuf,
    dry_run: bool,
}

impl CommandReboot {
    pub fn new(program: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            program: program.into(),
            dry_run,
        }
    }
}

impl RebootPrimitive for CommandReboot {
    fn reboot(&mut self, target: RebootTarget) -> rescue_core::Result<()> {
        let args = reboot_args(target);
        if self.dry_run {
            tracing::info!("Dry run: would run {} {}", self.program.display(), args.join(" "));
            return Ok(());
        }

        let status = Command::new(&self.program).args(&args).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(RecoveryError::Reboot {
                target: target.as_str(),
                reason: format!("{} exited with {}", self.program.display(), status),
            })
        }
    }
}

/// Hands the partition spec to an external tool as its only argument.
pub struct CommandPartitioner {
    tool: Option<PathBuf>,
}

impl CommandPartitioner {
    pub fn new(tool: Option<PathBuf>) -> Self {
        Self { tool }
    }
}

impl SdCardPartitioner for CommandPartitioner {
    fn format_sdcard(&mut self, spec: &str) -> rescue_core::Result<()> {
        let tool = self.tool.as_ref().ok_or_else(|| RecoveryError::Collaborator {
            collaborator: "SD card partitioner",
            reason: "no partition tool configured".to_string(),
        })?;

        tracing::info!("Partitioning SD card with {} {}", tool.display(), spec);
        let status = Command::new(tool).arg(spec).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(RecoveryError::Collaborator {
                collaborator: "SD card partitioner",
                reason: format!("{} exited with {}", tool.display(), status),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reboot_args() {
        assert!(reboot_args(RebootTarget::System).is_empty());
        assert_eq!(reboot_args(RebootTarget::Poweroff), vec!["-p"]);
        assert_eq!(reboot_args(RebootTarget::Bootloader), vec!["bootloader"]);
        assert_eq!(reboot_args(RebootTarget::Zboot), vec!["zboot"]);
    }

    #[test]
    fn test_dry_run_does_not_spawn() {
        let mut reboot = CommandReboot::new("/nonexistent/reboot", true);
        assert!(reboot.reboot(RebootTarget::Recovery).is_ok());
    }

    #[test]
    fn test_missing_reboot_program_is_an_error() {
        let mut reboot = CommandReboot::new("/nonexistent/reboot", false);
        assert!(reboot.reboot(RebootTarget::System).is_err());
    }

    #[test]
    fn test_unconfigured_partitioner_refuses() {
        let mut partitioner = CommandPartitioner::new(None);
        assert!(matches!(
            partitioner.format_sdcard("1024,0,0"),
            Err(RecoveryError::Collaborator { .. })
        ));
    }
}
