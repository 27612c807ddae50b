// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Argument source resolution.
//!
//! Startup arguments come from, in decreasing precedence:
//! - the process command line, when it carries more than the program name
//! - the control block `recovery` field (one per line, after "recovery")
//! - the command file (one per line)
//!
//! Sources are never merged: the first one that yields arguments wins.

use std::fmt;

use serde::Serialize;

use crate::config::RecoveryConfig;
use crate::control_block::{BootControlBlock, FieldState};
use crate::error::{RecoveryError, Result};

/// First line of a valid `recovery` field.
pub const RECOVERY_MARKER: &str = "recovery";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentSource {
    ProcessArgs,
    ControlBlockArgs,
    CommandFileArgs,
}

impl fmt::Display for ArgumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgumentSource::ProcessArgs => "process arguments",
            ArgumentSource::ControlBlockArgs => "bootloader control block",
            ArgumentSource::CommandFileArgs => "command file",
        };
        f.write_str(name)
    }
}

/// Ordered argument vector; index 0 is the program name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArguments {
    args: Vec<String>,
    source: ArgumentSource,
}

impl ResolvedArguments {
    pub fn new(args: Vec<String>, source: ArgumentSource) -> Self {
        Self { args, source }
    }

    pub fn source(&self) -> ArgumentSource {
        self.source
    }

    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or(RECOVERY_MARKER)
    }

    /// Everything after the program name.
    pub fn flags(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.args
    }
}

/// Line-oriented argument file consumed at startup.
pub trait CommandSource {
    /// Returns up to `max_lines` arguments, each at most `max_line_len - 1`
    /// bytes, or `Ok(None)` when there is no file.
    fn read_lines(&mut self, max_lines: usize, max_line_len: usize) -> Result<Option<Vec<String>>>;

    fn describe(&self) -> String;
}

/// Picks the argument vector for this session.
///
/// Never fails: unavailable sources are logged and skipped, and the bare
/// program name is returned when nothing else yields arguments.
pub fn resolve_arguments<C: CommandSource + ?Sized>(
    argv: Vec<String>,
    block: &BootControlBlock,
    commands: &mut C,
    config: &RecoveryConfig,
) -> ResolvedArguments {
    if argv.len() > 1 {
        return ResolvedArguments::new(argv, ArgumentSource::ProcessArgs);
    }

    let program = argv
        .into_iter()
        .next()
        .unwrap_or_else(|| RECOVERY_MARKER.to_string());

    if let Some(args) = from_control_block(block, config.max_args) {
        tracing::info!("Got arguments from boot message");
        return ResolvedArguments::new(args, ArgumentSource::ControlBlockArgs);
    }

    match from_command_source(program.clone(), commands, config) {
        Ok(Some(args)) => {
            tracing::info!("Got arguments from {}", commands.describe());
            ResolvedArguments::new(args, ArgumentSource::CommandFileArgs)
        }
        Ok(None) => ResolvedArguments::new(vec![program], ArgumentSource::ProcessArgs),
        Err(e) => {
            tracing::error!("{}", e);
            ResolvedArguments::new(vec![program], ArgumentSource::ProcessArgs)
        }
    }
}

/// Splits the `recovery` field into arguments. Yields nothing unless the
/// first line is exactly [`RECOVERY_MARKER`] and at least one argument follows.
pub fn from_control_block(block: &BootControlBlock, max_args: usize) -> Option<Vec<String>> {
    let text = match block.recovery() {
        FieldState::Unset => return None,
        FieldState::Text(text) => text,
    };

    // Empty lines are skipped, as a strtok-based reader would.
    let mut tokens = text.split('\n').filter(|token| !token.is_empty());
    if tokens.next() != Some(RECOVERY_MARKER) {
        let preview: String = text.chars().take(20).collect();
        tracing::warn!("Bad boot message {:?}", preview);
        return None;
    }

    let mut args = vec![RECOVERY_MARKER.to_string()];
    let mut dropped = 0;
    for token in tokens {
        if args.len() < max_args {
            args.push(token.to_string());
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        tracing::warn!(
            "{}",
            RecoveryError::CapacityExceeded {
                what: "boot message arguments",
                len: args.len() + dropped,
                limit: max_args,
            }
        );
    }

    (args.len() > 1).then_some(args)
}

fn from_command_source<C: CommandSource + ?Sized>(
    program: String,
    commands: &mut C,
    config: &RecoveryConfig,
) -> Result<Option<Vec<String>>> {
    let max_lines = config.max_args.saturating_sub(1);
    let lines = commands
        .read_lines(max_lines, config.max_arg_length)
        .map_err(|e| RecoveryError::SourceUnavailable {
            source_kind: ArgumentSource::CommandFileArgs,
            reason: e.to_string(),
        })?;

    Ok(lines.filter(|lines| !lines.is_empty()).map(|lines| {
        let mut args = Vec::with_capacity(lines.len() + 1);
        args.push(program);
        args.extend(lines);
        args
    }))
}
