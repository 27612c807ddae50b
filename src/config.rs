// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants and the startup configuration.

use std::path::PathBuf;

/// Well-known location of the one-argument-per-line command file.
pub const COMMAND_FILE: &str = "/cache/recovery/command";

/// Where the requested reboot token is recorded before rebooting.
pub const INTENT_FILE: &str = "/cache/recovery/intent";

/// Queue consumed by the recovery script interpreter.
pub const SCRIPT_FILE: &str = "/tmp/openrecoveryscript";

/// Raw partition holding the bootloader control block.
pub const MISC_PARTITION: &str = "/dev/block/by-name/misc";

/// Maximum number of arguments, argument 0 included.
pub const MAX_ARGS: usize = 100;

/// Maximum length of a single command file line, terminator included.
pub const MAX_ARG_LENGTH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    pub control_block_path: PathBuf,
    /// Byte offset of the record inside `control_block_path`.
    pub control_block_offset: u64,
    pub command_file: PathBuf,
    pub intent_file: PathBuf,
    pub script_file: PathBuf,
    pub max_args: usize,
    pub max_arg_length: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            control_block_path: PathBuf::from(MISC_PARTITION),
            control_block_offset: 0,
            command_file: PathBuf::from(COMMAND_FILE),
            intent_file: PathBuf::from(INTENT_FILE),
            script_file: PathBuf::from(SCRIPT_FILE),
            max_args: MAX_ARGS,
            max_arg_length: MAX_ARG_LENGTH,
        }
    }
}
