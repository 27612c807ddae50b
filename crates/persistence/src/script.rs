use crate::error::Result;
use rescue_core::pipeline::ScriptQueue;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Append-only script queue file consumed by the script interpreter.
#[derive(Debug, Clone)]
pub struct ScriptFile {
    path: PathBuf,
}

impl ScriptFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, command: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.write_all(command.trim_end_matches('\n').as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_data()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<String>> {
        let file = File::open(&self.path)?;
        let mut commands = Vec::new();
        for line in BufReader::new(file).lines() {
            commands.push(line?);
        }
        Ok(commands)
    }
}

impl ScriptQueue for ScriptFile {
    fn insert(&mut self, command: &str) -> rescue_core::Result<()> {
        tracing::info!("Queueing script command: {}", command);
        Ok(self.append(command)?)
    }
}
