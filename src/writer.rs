// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Control block write-back.
//!
//! Before any directive runs, the resolved arguments are written back with
//! the command forced to `boot-recovery`. A crash from then on brings the
//! device back into recovery with the same arguments instead of booting the
//! OS on a half-applied state.

use crate::args::RECOVERY_MARKER;
use crate::control_block::{BootControlBlock, ControlBlockStore, Field, BOOT_RECOVERY};
use crate::directive::is_persistable;
use crate::error::{RecoveryError, Result};

/// Result of staging arguments into a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBlock {
    pub block: BootControlBlock,
    /// Arguments left out of the `recovery` field.
    pub dropped: usize,
}

/// Returns `base` with `command = boot-recovery` and `recovery` holding the
/// marker line followed by one line per argument. Status and stage are kept.
///
/// Only whole lines are written: an argument that would overflow the field
/// is dropped together with everything after it. An argument holding a line
/// break or NUL is dropped on its own, since it could not be read back as
/// the same single argument.
pub fn stage_recovery_args(base: &BootControlBlock, flags: &[String]) -> StagedBlock {
    let limit = Field::Recovery.max_text_len();
    let mut text = format!("{}\n", RECOVERY_MARKER);
    let mut dropped = 0;
    for (i, arg) in flags.iter().enumerate() {
        if !is_persistable(arg) {
            tracing::warn!(
                "{}; argument not persisted",
                RecoveryError::MalformedDirective {
                    arg: arg.clone(),
                    reason: "embedded line break or NUL",
                }
            );
            dropped += 1;
            continue;
        }
        if text.len() + arg.len() + 1 > limit {
            let rest = &flags[i..];
            tracing::warn!(
                "{}; {} argument(s) not persisted",
                RecoveryError::CapacityExceeded {
                    what: "recovery field",
                    len: text.len() + rest.iter().map(|a| a.len() + 1).sum::<usize>(),
                    limit,
                },
                rest.len()
            );
            dropped += rest.len();
            break;
        }
        text.push_str(arg);
        text.push('\n');
    }

    let mut block = base.clone();
    block.set_command(BOOT_RECOVERY);
    block.set_recovery(&text);
    StagedBlock { block, dropped }
}

/// Returns `base` with `command` and `recovery` cleared so the next boot is a
/// normal one.
pub fn finish_recovery(base: &BootControlBlock) -> BootControlBlock {
    let mut block = base.clone();
    block.set_command("");
    block.set_recovery("");
    block
}

pub struct ControlBlockWriter<'a, S: ControlBlockStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: ControlBlockStore + ?Sized> ControlBlockWriter<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Persists the re-entry block. Failure is reported, never fatal: the
    /// session carries on in memory without its crash-safety guarantee.
    pub fn persist(&mut self, base: &BootControlBlock, flags: &[String]) -> Result<StagedBlock> {
        let staged = stage_recovery_args(base, flags);
        self.store
            .write_block(&staged.block)
            .map_err(|e| RecoveryError::PersistenceFailure(e.to_string()))?;
        tracing::debug!("Control block set to re-enter recovery with {} argument(s)", flags.len() - staged.dropped);
        Ok(staged)
    }

    /// Clears the recovery request.
    pub fn finish(&mut self, base: &BootControlBlock) -> Result<BootControlBlock> {
        let block = finish_recovery(base);
        self.store
            .write_block(&block)
            .map_err(|e| RecoveryError::PersistenceFailure(e.to_string()))?;
        tracing::info!("Control block cleared; next boot is a normal boot");
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::from_control_block;
    use crate::control_block::FieldState;

    #[derive(Default)]
    struct MemoryStore {
        block: Option<BootControlBlock>,
        fail_writes: bool,
    }

    impl ControlBlockStore for MemoryStore {
        fn read_block(&mut self) -> Result<BootControlBlock> {
            Ok(self.block.clone().unwrap_or_default())
        }

        fn write_block(&mut self, block: &BootControlBlock) -> Result<()> {
            if self.fail_writes {
                return Err(RecoveryError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "read-only",
                )));
            }
            self.block = Some(block.clone());
            Ok(())
        }
    }

    fn flags(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_staged_layout() {
        let staged = stage_recovery_args(&BootControlBlock::zeroed(), &flags(&["--wipe_cache", "--update_package=a.zip"]));
        assert_eq!(staged.dropped, 0);
        assert_eq!(staged.block.command(), FieldState::Text(BOOT_RECOVERY.to_string()));
        assert_eq!(
            staged.block.recovery(),
            FieldState::Text("recovery\n--wipe_cache\n--update_package=a.zip\n".to_string())
        );
    }

    #[test]
    fn test_status_and_stage_preserved() {
        let mut base = BootControlBlock::zeroed();
        base.set_field(Field::Status, "OKAY");
        base.set_field(Field::Stage, "2/3");

        let staged = stage_recovery_args(&base, &flags(&["--wipe_data"]));
        assert_eq!(staged.block.status(), FieldState::Text("OKAY".to_string()));
        assert_eq!(staged.block.stage(), FieldState::Text("2/3".to_string()));
    }

    #[test]
    fn test_no_arguments_still_forces_reentry() {
        let staged = stage_recovery_args(&BootControlBlock::zeroed(), &[]);
        assert_eq!(staged.block.command().as_text(), Some(BOOT_RECOVERY));
        assert_eq!(staged.block.recovery().as_text(), Some("recovery\n"));
    }

    #[test]
    fn test_overflow_drops_whole_arguments() {
        // 101-byte arguments plus newline after the 9-byte marker line.
        let long: Vec<String> = (0..10).map(|i| format!("--update_package={}", "x".repeat(83) + &i.to_string())).collect();
        assert_eq!(long[0].len(), 101);

        let staged = stage_recovery_args(&BootControlBlock::zeroed(), &long);
        assert_eq!(staged.dropped, 3);

        let round_trip = from_control_block(&staged.block, 100).unwrap();
        assert_eq!(&round_trip[1..], &long[..7]);
    }

    #[test]
    fn test_unsafe_arguments_are_dropped_alone() {
        let args = flags(&["--update_package=/sdcard/a\n--wipe_data", "--wipe_cache", "--nandroid\0x", "--nandroid"]);

        let staged = stage_recovery_args(&BootControlBlock::zeroed(), &args);
        assert_eq!(staged.dropped, 2);
        assert_eq!(staged.block.recovery().as_text(), Some("recovery\n--wipe_cache\n--nandroid\n"));
    }

    #[test]
    fn test_persist_round_trip() {
        let mut store = MemoryStore::default();
        let args = flags(&["--nandroid", "--shutdown_to=poweroff"]);

        ControlBlockWriter::new(&mut store).persist(&BootControlBlock::zeroed(), &args).unwrap();

        let block = store.read_block().unwrap();
        assert_eq!(from_control_block(&block, 100).unwrap()[1..], args[..]);
    }

    #[test]
    fn test_persist_failure_is_reported() {
        let mut store = MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        };
        let result = ControlBlockWriter::new(&mut store).persist(&BootControlBlock::zeroed(), &[]);
        assert!(matches!(result, Err(RecoveryError::PersistenceFailure(_))));
    }

    #[test]
    fn test_finish_clears_request() {
        let mut store = MemoryStore::default();
        let staged = ControlBlockWriter::new(&mut store)
            .persist(&BootControlBlock::zeroed(), &flags(&["--wipe_data"]))
            .unwrap();

        let cleared = ControlBlockWriter::new(&mut store).finish(&staged.block).unwrap();
        assert!(cleared.command().is_unset());
        assert!(cleared.recovery().is_unset());
        assert!(store.read_block().unwrap().is_zeroed());
    }
}
