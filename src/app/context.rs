use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{Backend, HttpBackend};
use crate::app::error::Result;
use crate::config::Config;
use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};
use crate::source::Sources;

/// Everything a command or the TUI needs, wired once at startup.
pub struct AppContext {
    pub config: Arc<Config>,
    pub session: Arc<dyn SessionStore>,
    pub backend: Arc<dyn Backend>,
    pub sources: Arc<Sources>,
}

impl AppContext {
    /// HTTP backend at `config.api.base_url`, token persisted at
    /// `token_path` (default `<data_dir>/plaza/token`).
    pub fn new(config: Config, token_path: Option<PathBuf>) -> Result<Self> {
        let token_path = match token_path {
            Some(p) => p,
            None => FileSessionStore::default_path()?,
        };
        let session: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(token_path));
        Self::with_session(config, session)
    }

    /// HTTP backend with a token that lives only as long as the process.
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_session(config, Arc::new(MemorySessionStore::new()))
    }

    fn with_session(config: Config, session: Arc<dyn SessionStore>) -> Result<Self> {
        let backend = HttpBackend::with_timeout(
            &config.api.base_url,
            session.clone(),
            Duration::from_secs(config.api.timeout_secs),
        )?;
        tracing::debug!("Using backend at {}", backend.base_url());
        Ok(Self::with_backend(config, session, Arc::new(backend)))
    }

    pub fn with_backend(
        config: Config,
        session: Arc<dyn SessionStore>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sources: Arc::new(Sources::new(backend.clone())),
            session,
            backend,
        }
    }
}
