use crate::error::{PersistenceError, Result};
use crc64fast::Digest;
use rescue_core::config::RecoveryConfig;
use rescue_core::control_block::{BootControlBlock, ControlBlockStore};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Control block stored at a fixed offset of the misc partition (or an
/// image file standing in for it).
#[derive(Debug, Clone)]
pub struct MiscStore {
    path: PathBuf,
    offset: u64,
}

impl MiscStore {
    pub fn new(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }

    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self::new(&config.control_block_path, config.control_block_offset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<BootControlBlock> {
        let mut file = File::open(&self.path)?;
        let buf = read_record(&mut file, self.offset)?;
        Ok(BootControlBlock::from_bytes(&buf))
    }

    /// Writes the whole record in one call, syncs it, then reads it back
    /// and compares checksums.
    pub fn write(&self, block: &BootControlBlock) -> Result<()> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;

        let bytes = block.to_bytes();
        file.seek(SeekFrom::Start(self.offset))?;
        file.write_all(&bytes)?;
        file.sync_data()?;

        let expected = checksum(&bytes);
        let found = checksum(&read_record(&mut file, self.offset)?);
        if expected != found {
            return Err(PersistenceError::ChecksumMismatch { expected, found });
        }

        tracing::debug!("Wrote control block to {:?} at offset {}", self.path, self.offset);
        Ok(())
    }
}

fn read_record(file: &mut File, offset: u64) -> Result<[u8; BootControlBlock::SIZE]> {
    let mut buf = [0u8; BootControlBlock::SIZE];
    file.seek(SeekFrom::Start(offset))?;
    match file.read_exact(&mut buf) {
        Ok(()) => Ok(buf),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(PersistenceError::InvalidFormat(format!(
            "short control block record at offset {} (need {} bytes)",
            offset,
            BootControlBlock::SIZE
        ))),
        Err(e) => Err(e.into()),
    }
}

pub fn checksum(data: &[u8]) -> u64 {
    let mut digest = Digest::new();
    digest.write(data);
    digest.sum64()
}

impl ControlBlockStore for MiscStore {
    fn read_block(&mut self) -> rescue_core::Result<BootControlBlock> {
        Ok(self.read()?)
    }

    fn write_block(&mut self, block: &BootControlBlock) -> rescue_core::Result<()> {
        Ok(self.write(block)?)
    }
}
