//! Atomic TOML file operations.
//!
//! Used for the configuration file, which may be edited by the user and by
//! the CLI at the same time.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use scribe_core::error::{Result, ScribeError};

/// A handle to a TOML file that is only ever replaced atomically.
///
/// - Updates go through a temp file + rename, so readers never see a
///   half-written file
/// - `update` holds an exclusive lock for the read-modify-write cycle
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and parses the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = toml::from_str(&content)?;
        Ok(Some(data))
    }

    /// Writes `data` to a sibling temp file, syncs it, then renames it over
    /// the target.
    pub fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(data)?;

        let tmp_path = temp_path_for(&self.path)?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Read-modify-write under an exclusive lock.
    ///
    /// `default_value` is used when the file does not exist yet. Returns the
    /// value that was written.
    pub fn update<F>(&self, default_value: T, f: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        f(&mut data)?;
        self.save(&data)?;
        Ok(data)
    }
}

/// `.<file name>.tmp` next to `path`.
pub(crate) fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| ScribeError::io(format!("Path has no parent directory: {:?}", path)))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| ScribeError::io(format!("Path has no file name: {:?}", path)))?;
    Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

/// Exclusive lock on `<path>.lock`, released on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| ScribeError::io(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        language: String,
        debounce_ms: u64,
    }

    fn defaults() -> Settings {
        Settings {
            language: "en-US".to_string(),
            debounce_ms: 1500,
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Settings>::new(temp_dir.path().join("config.toml"));

        file.save(&defaults()).unwrap();

        assert_eq!(file.load().unwrap(), Some(defaults()));
        assert!(!temp_dir.path().join(".config.toml.tmp").exists());
    }

    #[test]
    fn test_load_missing_or_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let file = AtomicTomlFile::<Settings>::new(path.clone());
        assert!(file.load().unwrap().is_none());

        fs::write(&path, "  \n").unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_invalid_toml_is_a_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "language = ").unwrap();

        let err = AtomicTomlFile::<Settings>::new(path).load().unwrap_err();
        assert!(matches!(err, ScribeError::Serialization { .. }));
    }

    #[test]
    fn test_update_creates_then_modifies() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Settings>::new(temp_dir.path().join("nested/config.toml"));

        file.update(defaults(), |s| {
            s.debounce_ms = 500;
            Ok(())
        })
        .unwrap();
        let written = file
            .update(defaults(), |s| {
                s.language = "ja-JP".to_string();
                Ok(())
            })
            .unwrap();

        assert_eq!(written.debounce_ms, 500);
        assert_eq!(file.load().unwrap().unwrap().language, "ja-JP");
        assert!(!temp_dir.path().join("nested/config.lock").exists());
    }
}
