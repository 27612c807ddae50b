// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use std::io;
use thiserror::Error;

use crate::args::ArgumentSource;

#[derive(Error, Debug)]
pub enum RecoveryError {
    /// Backing store or command file missing or unreadable.
    #[error("{source_kind} unavailable: {reason}")]
    SourceUnavailable {
        source_kind: ArgumentSource,
        reason: String,
    },
    /// A flag that needs a payload came without one.
    #[error("malformed directive {arg:?}: {reason}")]
    MalformedDirective { arg: String, reason: &'static str },
    /// More arguments, or longer ones, than the fixed maximum.
    #[error("capacity exceeded in {what}: {len} > {limit}")]
    CapacityExceeded {
        what: &'static str,
        len: usize,
        limit: usize,
    },
    /// The control block could not be durably written.
    #[error("control block write failed: {0}")]
    PersistenceFailure(String),
    /// An external collaborator (script queue, partitioner) refused work.
    #[error("{collaborator} failed: {reason}")]
    Collaborator {
        collaborator: &'static str,
        reason: String,
    },
    #[error("reboot to {target} failed: {reason}")]
    Reboot { target: &'static str, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, RecoveryError>;
