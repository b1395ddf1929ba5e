//! Persistence for the session credential.

use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::Session;
use crate::runtime::{Runtime, write_atomic};

/// File name of the persisted session inside the state directory.
pub const SESSION_FILE: &str = "session.json";

#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Session>;
    fn save(&self, session: &Session) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Keeps the session as JSON in `<state-dir>/session.json`.
pub struct FileSessionStore<R: Runtime> {
    runtime: R,
    path: PathBuf,
}

impl<R: Runtime> FileSessionStore<R> {
    pub fn new(runtime: R, state_dir: &Path) -> Self {
        Self {
            runtime,
            path: state_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Runtime> SessionStore for FileSessionStore<R> {
    #[tracing::instrument(skip(self))]
    fn load(&self) -> Result<Session> {
        if !self.runtime.exists(&self.path) {
            debug!("No session file at {:?}", self.path);
            return Ok(Session::default());
        }
        let content = self.runtime.read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file {:?}", self.path))?;
        Ok(session)
    }

    #[tracing::instrument(skip(self, session))]
    fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_vec_pretty(session)?;
        write_atomic(&self.runtime, &self.path, &json)
            .with_context(|| format!("Failed to save session to {:?}", self.path))
    }

    #[tracing::instrument(skip(self))]
    fn clear(&self) -> Result<()> {
        if self.runtime.exists(&self.path) {
            self.runtime.remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// A store that lives only as long as the process.
#[derive(Default)]
pub struct MemorySessionStore {
    saved: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            saved: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Session> {
        let saved = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        Ok(saved.clone().unwrap_or_default())
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut saved = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        *saved = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut saved = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        *saved = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::User;
    use crate::runtime::{MockRuntime, RealRuntime};
    use tempfile::tempdir;

    fn sample_session() -> Session {
        Session {
            token: Some("a.b.c".to_string()),
            user: Some(User {
                id: "3".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                ..Default::default()
            }),
            is_demo: false,
            banner_url: None,
            profile_url: Some("https://cdn.example.com/p.png".to_string()),
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(RealRuntime, dir.path());

        assert_eq!(store.load().unwrap(), Session::default());

        store.save(&sample_session()).unwrap();
        assert_eq!(store.load().unwrap(), sample_session());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"profileURL\""));
        assert!(raw.contains("\"isDemo\""));

        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("{not json".to_string()));

        let store = FileSessionStore::new(runtime, Path::new("/state"));
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse session file"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), Session::default());
        store.save(&sample_session()).unwrap();
        assert_eq!(store.load().unwrap(), sample_session());
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), Session::default());
    }
}
