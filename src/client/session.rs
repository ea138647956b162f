use crate::model::{LoginResponse, SessionIdentity};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// What a login leaves behind on the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub identity: SessionIdentity,
    pub token: String,
    pub login_at: DateTime<Utc>,
}

/// Key/value home of the client session
pub trait SessionStore: Send {
    fn load(&self) -> Result<Option<StoredSession>>;
    fn save(&mut self, session: &StoredSession) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Session kept in process memory; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<StoredSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(session))),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<StoredSession>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.slot().clone())
    }

    fn save(&mut self, session: &StoredSession) -> Result<()> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// Session persisted as a JSON file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt session file {}", self.path.display()))?;

        Ok(Some(session))
    }

    fn save(&mut self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create session directory")?;
        }

        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;

        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove session file {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// True once more than `ttl` has passed since `login_at`
pub fn is_expired(login_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - login_at > ttl
}

/// The logged-in identity, handed explicitly to whatever needs it
pub struct SessionContext {
    store: Box<dyn SessionStore>,
    ttl: Duration,
}

impl SessionContext {
    pub fn new(store: impl SessionStore + 'static, ttl: Duration) -> Self {
        Self {
            store: Box::new(store),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The live session, or `None` when logged out.
    ///
    /// An expired or unreadable session is cleared on the way out, so the
    /// next caller starts from the logged-out state too.
    pub fn current(&mut self, now: DateTime<Utc>) -> Option<StoredSession> {
        let session = match self.store.load() {
            Ok(session) => session?,
            Err(e) => {
                warn!("Discarding unreadable session: {:#}", e);
                self.clear_quietly();
                return None;
            }
        };

        if is_expired(session.login_at, now, self.ttl) {
            info!("Session for {} expired, logging out", session.identity.email);
            self.clear_quietly();
            return None;
        }

        Some(session)
    }

    pub fn identity(&mut self, now: DateTime<Utc>) -> Option<SessionIdentity> {
        self.current(now).map(|s| s.identity)
    }

    pub fn login(&mut self, response: &LoginResponse, now: DateTime<Utc>) -> Result<StoredSession> {
        let session = StoredSession {
            identity: response.identity(),
            token: response.token.clone(),
            login_at: now,
        };
        self.store.save(&session)?;

        info!("Logged in as {} {}", session.identity.user_type, session.identity.email);
        Ok(session)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()
    }

    fn clear_quietly(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear session: {:#}", e);
        }
    }
}
