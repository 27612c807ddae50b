use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Records the requested reboot token for whatever runs after recovery.
/// Returns `false` (and writes nothing) for an empty token.
pub fn write_intent(path: impl AsRef<Path>, token: &str) -> Result<bool> {
    if token.is_empty() {
        return Ok(false);
    }

    let mut file = File::create(path.as_ref())?;
    file.write_all(token.as_bytes())?;
    file.sync_data()?;
    tracing::debug!("Wrote intent {:?} to {:?}", token, path.as_ref());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_intent_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("intent");

        assert!(write_intent(&path, "bootloader").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "bootloader");
    }

    #[test]
    fn test_empty_intent_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("intent");

        assert!(!write_intent(&path, "").unwrap());
        assert!(!path.exists());
    }
}
