use rescue_core::RecoveryError;
use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Checksum mismatch after write: expected {expected:016x}, found {found:016x}")]
    ChecksumMismatch {
        expected: u64,
        found: u64,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

impl From<PersistenceError> for RecoveryError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::IoError(e) => RecoveryError::Io(e),
            other => RecoveryError::PersistenceFailure(other.to_string()),
        }
    }
}
