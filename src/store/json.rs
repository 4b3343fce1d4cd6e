//! Atomic JSON persistence
//!
//! Every artifact is written to a sibling temp file, synced, then renamed into
//! place so a reader never sees a partial file. Unreadable files are treated
//! as absent.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::{CviError, CviResult};

/// Write bytes to `path` atomically, creating parent directories
pub fn write_atomic(path: &Path, bytes: &[u8]) -> CviResult<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| CviError::invalid_input(format!("not a file path: {}", path.display())))?;
    let temp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Serialize as pretty JSON and write atomically
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> CviResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes)
}

/// Read JSON from `path`; `None` when missing
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CviResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Read JSON, treating missing, unreadable or corrupt files as the default
pub fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable state");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/state.json");

        let mut value = BTreeMap::new();
        value.insert("btc".to_string(), 1.5);
        write_json(&path, &value).unwrap();

        let back: Option<BTreeMap<String, f64>> = read_json(&path).unwrap();
        assert_eq!(back, Some(value));

        // No temp file left behind
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_missing_is_none() {
        let dir = tempdir().unwrap();
        let back: Option<Vec<f64>> = read_json(&dir.path().join("absent.json")).unwrap();
        assert!(back.is_none());
    }

    #[test]
    fn test_corrupt_is_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, b"[1.0, 2.0").unwrap();

        assert!(read_json::<Vec<f64>>(&path).is_err());
        let healed: Vec<f64> = read_or_default(&path);
        assert!(healed.is_empty());
    }
}
