//! Configuration service implementation.
//!
//! Loads `config.toml` from the Scribe base directory, writing the defaults
//! on first use, and caches the result.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use scribe_core::config::ScribeConfig;
use scribe_core::error::{Result, ScribeError};

use crate::paths::ScribePaths;
use crate::storage::AtomicTomlFile;

/// Environment variable overriding `gemini.api_key`.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration service that loads and caches [`ScribeConfig`].
#[derive(Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration (environment overrides applied).
    config: Arc<RwLock<Option<ScribeConfig>>>,
}

impl ConfigService {
    pub fn new(paths: &ScribePaths) -> Self {
        Self::with_path(paths.config_file())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading it from disk if not cached.
    pub fn get_config(&self) -> Result<ScribeConfig> {
        {
            let cached = self
                .config
                .read()
                .map_err(|_| ScribeError::internal("config cache lock poisoned"))?;
            if let Some(ref config) = *cached {
                return Ok(config.clone());
            }
        }

        let mut loaded = self.load_or_create()?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        let mut cached = self
            .config
            .write()
            .map_err(|_| ScribeError::internal("config cache lock poisoned"))?;
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Applies `f` to the stored configuration and persists the result.
    ///
    /// Environment overrides are not written back to the file.
    /// A failing `f` leaves the file untouched.
    pub fn update<F>(&self, f: F) -> Result<ScribeConfig>
    where
        F: FnOnce(&mut ScribeConfig) -> Result<()>,
    {
        let file = AtomicTomlFile::<ScribeConfig>::new(self.path.clone());
        file.update(ScribeConfig::default(), f)?;
        self.invalidate_cache();
        self.get_config()
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut cached) = self.config.write() {
            *cached = None;
        }
    }

    fn load_or_create(&self) -> Result<ScribeConfig> {
        let file = AtomicTomlFile::<ScribeConfig>::new(self.path.clone());
        match file.load()? {
            Some(config) => Ok(config),
            None => {
                let config = ScribeConfig::default();
                file.save(&config)?;
                tracing::info!("Wrote default configuration to {:?}", self.path);
                Ok(config)
            }
        }
    }
}

/// Overlays environment values on top of the file configuration.
pub fn apply_env_overrides<F>(config: &mut ScribeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(GEMINI_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        config.gemini.api_key = key;
    }
}
