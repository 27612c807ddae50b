// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Startup flag parsing.
//!
//! Each argument may carry up to two leading dashes. The first remaining
//! character selects the directive:
//!
//! | flag | directive |
//! |------|-----------|
//! | `u=<zip>` | install package |
//! | `w` (9 chars) | factory reset |
//! | `w` (10 chars) | wipe cache |
//! | `n` | backup |
//! | `r=<path>` | restore |
//! | `p=<spec>` | partition SD card |
//! | `s=<target>` | reboot target |
//!
//! Unknown flags are logged and ignored so newer callers keep working.

use serde::Serialize;

use crate::args::ResolvedArguments;
use crate::error::RecoveryError;

/// Partitions included in a startup-requested backup.
pub const BACKUP_PARTITIONS: &str = "BSDCAE";

// `wipe_data` and `wipe_cache` are only told apart by length.
const FACTORY_RESET_FLAG_LEN: usize = 9;
const WIPE_CACHE_FLAG_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    Install { zip_path: String },
    WipeCache,
    FactoryReset,
    Backup,
    Restore { path: String },
    PartitionSdCard { spec: String },
    /// Raw reboot token, mapped to a target only at dispatch time.
    RebootTo { target: String },
}

fn strip_dashes(arg: &str) -> &str {
    let arg = arg.strip_prefix('-').unwrap_or(arg);
    arg.strip_prefix('-').unwrap_or(arg)
}

fn payload(arg: &str, flag: &str) -> Result<String, RecoveryError> {
    match flag.split_once('=') {
        None => Err(RecoveryError::MalformedDirective {
            arg: arg.to_string(),
            reason: "missing '=' before value",
        }),
        Some((_, "")) => Err(RecoveryError::MalformedDirective {
            arg: arg.to_string(),
            reason: "empty value",
        }),
        Some((_, value)) => Ok(value.to_string()),
    }
}

/// True when `arg` survives a write to the `recovery` field unchanged.
/// A line break would split it on re-entry, a NUL would end the field early.
pub fn is_persistable(arg: &str) -> bool {
    !arg.contains(|c| c == '\n' || c == '\0')
}

/// Parses one argument. `Ok(None)` means the argument carries no directive.
pub fn parse_flag(arg: &str) -> Result<Option<Directive>, RecoveryError> {
    if !is_persistable(arg) {
        return Err(RecoveryError::MalformedDirective {
            arg: arg.to_string(),
            reason: "embedded line break or NUL",
        });
    }
    let flag = strip_dashes(arg);
    let directive = match flag.chars().next() {
        Some('u') => Directive::Install {
            zip_path: payload(arg, flag)?,
        },
        Some('w') => match flag.len() {
            FACTORY_RESET_FLAG_LEN => Directive::FactoryReset,
            WIPE_CACHE_FLAG_LEN => Directive::WipeCache,
            len => {
                tracing::info!("Ignoring wipe flag {:?} of length {}", arg, len);
                return Ok(None);
            }
        },
        Some('n') => Directive::Backup,
        Some('s') => Directive::RebootTo {
            target: payload(arg, flag)?,
        },
        Some('r') => Directive::Restore {
            path: payload(arg, flag)?,
        },
        Some('p') => Directive::PartitionSdCard {
            spec: payload(arg, flag)?,
        },
        Some(_) => {
            tracing::info!("Ignoring unknown startup flag {:?}", arg);
            return Ok(None);
        }
        None => return Ok(None),
    };
    Ok(Some(directive))
}

/// Parses every argument after the program name, in order. Malformed
/// flags are logged and dropped; parsing continues with the next one.
pub fn parse_directives(args: &ResolvedArguments) -> Vec<Directive> {
    let echoed: Vec<String> = args.flags().iter().map(|a| format!("'{}'", a)).collect();
    tracing::info!("Startup commands: {}", echoed.join(" "));

    args.flags()
        .iter()
        .filter_map(|arg| match parse_flag(arg) {
            Ok(directive) => directive,
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Wipe {
    Cache,
    FactoryReset,
}

/// Directives folded into what a session will actually do. Single-valued
/// directives are last-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectivePlan {
    pub install: Option<String>,
    pub wipe: Option<Wipe>,
    pub backup: bool,
    pub restore: Option<String>,
    pub partition_sdcard: Option<String>,
    pub reboot_token: Option<String>,
}

impl DirectivePlan {
    pub fn from_directives(directives: &[Directive]) -> Self {
        let mut plan = Self::default();
        for directive in directives {
            match directive {
                Directive::Install { zip_path } => plan.install = Some(zip_path.clone()),
                Directive::WipeCache => plan.wipe = Some(Wipe::Cache),
                Directive::FactoryReset => plan.wipe = Some(Wipe::FactoryReset),
                Directive::Backup => plan.backup = true,
                Directive::Restore { path } => plan.restore = Some(path.clone()),
                Directive::PartitionSdCard { spec } => plan.partition_sdcard = Some(spec.clone()),
                Directive::RebootTo { target } => plan.reboot_token = Some(target.clone()),
            }
        }
        plan
    }

    pub fn parse(args: &ResolvedArguments) -> Self {
        Self::from_directives(&parse_directives(args))
    }

    /// Script commands in execution order: backup (or else restore), then
    /// install, then the wipe.
    pub fn script_commands(&self) -> Vec<String> {
        let mut commands = Vec::new();
        if self.backup {
            commands.push(format!("backup {}", BACKUP_PARTITIONS));
        } else if let Some(path) = &self.restore {
            commands.push(format!("restore {}", path));
        }
        if let Some(zip) = &self.install {
            commands.push(format!("install {}", zip));
        }
        match self.wipe {
            Some(Wipe::FactoryReset) => commands.push("wipe data".to_string()),
            Some(Wipe::Cache) => commands.push("wipe cache".to_string()),
            None => {}
        }
        commands
    }

    /// True when nothing but a reboot was requested.
    pub fn is_idle(&self) -> bool {
        self.partition_sdcard.is_none() && self.script_commands().is_empty()
    }
}
