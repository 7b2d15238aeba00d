//! Unified path management for Scribe files.
//!
//! Everything lives under one base directory, resolved once:
//!
//! ```text
//! ~/.config/scribe/            # base (or $SCRIBE_HOME)
//! ├── config.toml              # Application configuration
//! ├── active_session.txt       # Id of the session restored on startup
//! ├── sessions/                # One JSON document (+ optional audio) per session
//! │   ├── <id>.json
//! │   └── <id>.audio
//! └── logs/
//!     └── scribe.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the base directory.
pub const SCRIBE_HOME_ENV: &str = "SCRIBE_HOME";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Neither `SCRIBE_HOME` nor a platform config directory is available.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScribePaths {
    base: PathBuf,
}

impl ScribePaths {
    /// Uses `base` as the root for every Scribe file.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Resolves the base directory from `SCRIBE_HOME`, falling back to the
    /// platform config directory (e.g. `~/.config/scribe`).
    pub fn resolve() -> Result<Self, PathError> {
        Self::resolve_with(std::env::var_os(SCRIBE_HOME_ENV).map(PathBuf::from))
    }

    fn resolve_with(home_override: Option<PathBuf>) -> Result<Self, PathError> {
        if let Some(home) = home_override.filter(|p| !p.as_os_str().is_empty()) {
            return Ok(Self::with_base(home));
        }
        dirs::config_dir()
            .map(|dir| Self::with_base(dir.join("scribe")))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.base.join("sessions")
    }

    pub fn active_session_file(&self) -> PathBuf {
        self.base.join("active_session.txt")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let paths = ScribePaths::resolve_with(Some(PathBuf::from("/tmp/scribe-home"))).unwrap();
        assert_eq!(paths.base_dir(), Path::new("/tmp/scribe-home"));
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/tmp/scribe-home/config.toml")
        );
    }

    #[test]
    fn test_layout_is_under_base() {
        let paths = ScribePaths::with_base("/data/scribe");
        assert!(paths.sessions_dir().ends_with("sessions"));
        assert!(paths.logs_dir().ends_with("logs"));
        assert!(paths.active_session_file().starts_with("/data/scribe"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        if let Ok(paths) = ScribePaths::resolve_with(Some(PathBuf::new())) {
            assert!(paths.base_dir().ends_with("scribe"));
        }
    }
}
