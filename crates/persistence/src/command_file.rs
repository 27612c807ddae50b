use crate::error::Result;
use rescue_core::args::CommandSource;
use rescue_core::RecoveryError;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Plain-text argument file, one argument per line. Read only, never written.
#[derive(Debug, Clone)]
pub struct CommandFile {
    path: PathBuf,
}

impl CommandFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `Ok(None)` when the file does not exist. Each line is cut at
    /// its first CR, LF or NUL. Blank lines are skipped and lines longer than
    /// `max_line_len - 1` bytes are truncated.
    pub fn read(&self, max_lines: usize, max_line_len: usize) -> Result<Option<Vec<String>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No command file at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let limit = max_line_len.saturating_sub(1);
        let mut lines = Vec::new();
        for raw in BufReader::new(file).split(b'\n') {
            let raw = raw?;
            let end = raw.iter().position(|b| *b == b'\r' || *b == 0).unwrap_or(raw.len());
            if end == 0 {
                continue;
            }
            if lines.len() == max_lines {
                tracing::warn!(
                    "{}",
                    RecoveryError::CapacityExceeded {
                        what: "command file lines",
                        len: max_lines + 1,
                        limit: max_lines,
                    }
                );
                break;
            }

            let mut line = String::from_utf8_lossy(&raw[..end]).into_owned();
            if line.len() > limit {
                tracing::warn!(
                    "{}",
                    RecoveryError::CapacityExceeded {
                        what: "command file line",
                        len: line.len(),
                        limit,
                    }
                );
                let mut cut = limit;
                while !line.is_char_boundary(cut) {
                    cut -= 1;
                }
                line.truncate(cut);
            }
            lines.push(line);
        }

        Ok(Some(lines))
    }
}

impl CommandSource for CommandFile {
    fn read_lines(&mut self, max_lines: usize, max_line_len: usize) -> rescue_core::Result<Option<Vec<String>>> {
        Ok(self.read(max_lines, max_line_len)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
