// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Bootloader control block codec.
//!
//! The record is shared with the bootloader and survives reboots. Layout
//! (2048 bytes, every field NUL padded to its width):
//!
//! `[command: 32][status: 32][recovery: 768][stage: 32][reserved: 1184]`
//!
//! A field whose first byte is `0x00` or `0xFF` (erased flash) is unset.

use std::fmt;
use std::io::Read;

use crate::error::Result;

pub const COMMAND_LEN: usize = 32;
pub const STATUS_LEN: usize = 32;
pub const RECOVERY_LEN: usize = 768;
pub const STAGE_LEN: usize = 32;
pub const RESERVED_LEN: usize = 1184;

/// Command telling the bootloader to start recovery again.
pub const BOOT_RECOVERY: &str = "boot-recovery";

const ERASED: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Command,
    Status,
    Recovery,
    Stage,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Command, Field::Status, Field::Recovery, Field::Stage];

    pub const fn capacity(self) -> usize {
        match self {
            Field::Command => COMMAND_LEN,
            Field::Status => STATUS_LEN,
            Field::Recovery => RECOVERY_LEN,
            Field::Stage => STAGE_LEN,
        }
    }

    /// Longest text the field can hold with its terminator.
    pub const fn max_text_len(self) -> usize {
        self.capacity() - 1
    }

    pub const fn name(self) -> &'static str {
        match self {
            Field::Command => "command",
            Field::Status => "status",
            Field::Recovery => "recovery",
            Field::Stage => "stage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldState {
    Unset,
    Text(String),
}

impl FieldState {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldState::Unset => None,
            FieldState::Text(text) => Some(text),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, FieldState::Unset)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct BootControlBlock {
    command: [u8; COMMAND_LEN],
    status: [u8; STATUS_LEN],
    recovery: [u8; RECOVERY_LEN],
    stage: [u8; STAGE_LEN],
    reserved: [u8; RESERVED_LEN],
}

impl BootControlBlock {
    pub const SIZE: usize = COMMAND_LEN + STATUS_LEN + RECOVERY_LEN + STAGE_LEN + RESERVED_LEN; // 2048 bytes

    const STATUS_AT: usize = COMMAND_LEN;
    const RECOVERY_AT: usize = Self::STATUS_AT + STATUS_LEN;
    const STAGE_AT: usize = Self::RECOVERY_AT + RECOVERY_LEN;
    const RESERVED_AT: usize = Self::STAGE_AT + STAGE_LEN;

    /// The block assumed when the backing store cannot be read.
    pub fn zeroed() -> Self {
        Self {
            command: [0; COMMAND_LEN],
            status: [0; STATUS_LEN],
            recovery: [0; RECOVERY_LEN],
            stage: [0; STAGE_LEN],
            reserved: [0; RESERVED_LEN],
        }
    }

    pub fn is_zeroed(&self) -> bool {
        self.to_bytes().iter().all(|b| *b == 0)
    }

    pub fn from_bytes(buf: &[u8; Self::SIZE]) -> Self {
        let mut block = Self::zeroed();
        block.command.copy_from_slice(&buf[..Self::STATUS_AT]);
        block.status.copy_from_slice(&buf[Self::STATUS_AT..Self::RECOVERY_AT]);
        block.recovery.copy_from_slice(&buf[Self::RECOVERY_AT..Self::STAGE_AT]);
        block.stage.copy_from_slice(&buf[Self::STAGE_AT..Self::RESERVED_AT]);
        block.reserved.copy_from_slice(&buf[Self::RESERVED_AT..]);
        block
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        reader.read_exact(&mut buf)?;
        Ok(Self::from_bytes(&buf))
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[..Self::STATUS_AT].copy_from_slice(&self.command);
        buf[Self::STATUS_AT..Self::RECOVERY_AT].copy_from_slice(&self.status);
        buf[Self::RECOVERY_AT..Self::STAGE_AT].copy_from_slice(&self.recovery);
        buf[Self::STAGE_AT..Self::RESERVED_AT].copy_from_slice(&self.stage);
        buf[Self::RESERVED_AT..].copy_from_slice(&self.reserved);
        buf
    }

    fn raw(&self, field: Field) -> &[u8] {
        match field {
            Field::Command => &self.command,
            Field::Status => &self.status,
            Field::Recovery => &self.recovery,
            Field::Stage => &self.stage,
        }
    }

    fn raw_mut(&mut self, field: Field) -> &mut [u8] {
        match field {
            Field::Command => &mut self.command,
            Field::Status => &mut self.status,
            Field::Recovery => &mut self.recovery,
            Field::Stage => &mut self.stage,
        }
    }

    /// Decodes a field. The last byte is always treated as the terminator,
    /// whatever the producer left there.
    pub fn field(&self, field: Field) -> FieldState {
        let raw = &self.raw(field)[..field.max_text_len()];
        match raw.first() {
            None | Some(0) | Some(&ERASED) => FieldState::Unset,
            Some(_) => {
                let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
                FieldState::Text(String::from_utf8_lossy(&raw[..end]).into_owned())
            }
        }
    }

    /// Replaces a field, zero padding the rest of it. Text longer than the
    /// field is truncated at a character boundary; returns `true` when that happened.
    pub fn set_field(&mut self, field: Field, value: &str) -> bool {
        let limit = field.max_text_len();
        let mut end = value.len().min(limit);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        let truncated = end < value.len();
        if truncated {
            tracing::warn!(
                "Truncating {} field: {} bytes exceed capacity of {}",
                field.name(),
                value.len(),
                limit
            );
        }

        let raw = self.raw_mut(field);
        raw.fill(0);
        raw[..end].copy_from_slice(&value.as_bytes()[..end]);
        truncated
    }

    pub fn command(&self) -> FieldState {
        self.field(Field::Command)
    }

    pub fn status(&self) -> FieldState {
        self.field(Field::Status)
    }

    pub fn recovery(&self) -> FieldState {
        self.field(Field::Recovery)
    }

    pub fn stage(&self) -> FieldState {
        self.field(Field::Stage)
    }

    pub fn set_command(&mut self, value: &str) -> bool {
        self.set_field(Field::Command, value)
    }

    pub fn set_recovery(&mut self, value: &str) -> bool {
        self.set_field(Field::Recovery, value)
    }

    /// Logs the bootloader-owned fields when they carry anything.
    pub fn log_boot_state(&self) {
        if let Some(command) = self.command().as_text() {
            tracing::info!("Boot command: {}", command);
        }
        if let Some(status) = self.status().as_text() {
            tracing::info!("Boot status: {}", status);
        }
    }
}

impl Default for BootControlBlock {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for BootControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootControlBlock")
            .field("command", &self.command())
            .field("status", &self.status())
            .field("recovery", &self.recovery())
            .field("stage", &self.stage())
            .finish()
    }
}

/// Platform access to the persisted control block.
pub trait ControlBlockStore {
    fn read_block(&mut self) -> Result<BootControlBlock>;

    /// Must write the whole record in one operation and flush it before returning.
    fn write_block(&mut self, block: &BootControlBlock) -> Result<()>;
}

/// Reads the control block, falling back to an all-zero block when the
/// store is unavailable. Startup has other argument sources, so a failed
/// read is never fatal.
pub fn read_or_zeroed<S: ControlBlockStore + ?Sized>(store: &mut S) -> BootControlBlock {
    match store.read_block() {
        Ok(block) => block,
        Err(e) => {
            tracing::warn!("Failed to read bootloader control block: {}. Assuming empty block.", e);
            BootControlBlock::zeroed()
        }
    }
}
