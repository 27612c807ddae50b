// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! rescue-core: startup command resolution for the recovery environment.
//!
//! Decides why recovery was entered and what it was asked to do, from the
//! process arguments, the bootloader control block and the command file,
//! and rewrites the control block so a crash re-enters recovery.

pub mod config;
pub mod error;
pub mod control_block;
pub mod args;
pub mod directive;
pub mod writer;
pub mod reboot;
pub mod pipeline;

pub use error::{RecoveryError, Result};

#[cfg(test)]
pub mod tests;
