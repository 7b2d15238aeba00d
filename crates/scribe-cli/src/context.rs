//! Shared services for the CLI commands.

use anyhow::{Context, Result};
use std::sync::Arc;

use scribe_application::{SessionStore, SessionUseCase};
use scribe_core::config::ScribeConfig;
use scribe_core::session::{Session, SessionRepository};
use scribe_infrastructure::{ConfigService, DirSessionRepository, ScribePaths};
use scribe_interaction::{GeminiClient, TextGenerator};

pub struct AppContext {
    pub paths: ScribePaths,
    pub config_service: ConfigService,
    pub config: ScribeConfig,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = ScribePaths::resolve().context("Failed to resolve the Scribe directory")?;
        let config_service = ConfigService::new(&paths);
        let config = config_service
            .get_config()
            .with_context(|| format!("Failed to load {}", config_service.path().display()))?;
        Ok(Self {
            paths,
            config_service,
            config,
        })
    }

    pub async fn repository(&self) -> Result<Arc<dyn SessionRepository>> {
        let repository = DirSessionRepository::from_paths(&self.paths)
            .await
            .context("Failed to open the session directory")?;
        Ok(Arc::new(repository))
    }

    /// A session use case over a fresh store.
    pub async fn sessions(&self) -> Result<SessionUseCase> {
        let store = Arc::new(SessionStore::new(
            Session::new(scribe_application::session_usecase::DEFAULT_SESSION_TITLE),
            self.config.history.max_depth,
        ));
        Ok(SessionUseCase::new(self.repository().await?, store))
    }

    pub fn gemini(&self) -> Result<Arc<dyn TextGenerator>> {
        let client = GeminiClient::from_config(&self.config.gemini).context(
            "Gemini is not configured; set GEMINI_API_KEY or gemini.api_key in config.toml",
        )?;
        Ok(Arc::new(client))
    }
}
