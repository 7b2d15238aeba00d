//! Low-level file storage primitives.

pub mod atomic_toml;

pub use atomic_toml::AtomicTomlFile;

use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use scribe_core::error::Result;

/// Async counterpart of [`AtomicTomlFile::save`] for raw bytes: write to a
/// sibling temp file, sync, rename over `path`.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp_path = atomic_toml::temp_path_for(path)?;
    let mut tmp_file = fs::File::create(&tmp_path).await?;
    tmp_file.write_all(bytes).await?;
    tmp_file.sync_all().await?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).await?;
    Ok(())
}
