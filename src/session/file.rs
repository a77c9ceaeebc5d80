use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::app::{PlazaError, Result};
use crate::session::SessionStore;

/// Token persisted in a single file under the data directory.
///
/// Reads are served from an in-memory copy that is refreshed on `set_token`
/// and `clear`.
pub struct FileSessionStore {
    path: PathBuf,
    cache: Mutex<Option<Option<String>>>,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: Mutex::new(None),
        }
    }

    /// `<data_dir>/plaza/token`
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| PlazaError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("plaza").join("token"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read token from {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Option<String> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.as_ref() {
            return cached.clone();
        }
        let token = self.read_file();
        *cache = Some(token.clone());
        token
    }

    fn set_token(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = Some(Some(token.to_string()));
        tracing::info!("Stored session token at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = Some(None);
        Ok(())
    }
}
