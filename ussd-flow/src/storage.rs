use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{error::Result, state::MenuState};

/// Idle seconds after which a session is swept.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 300;

/// Session information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Supplied by the USSD gateway, never generated here.
    pub id: String,
    pub phone_number: String,
    pub menu: MenuState,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            phone_number: phone_number.into(),
            menu: MenuState::Main,
            created_at: now,
            last_accessed_at: now,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_accessed_at > ttl
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Return the stored session with a refreshed access time, or store and
    /// return a fresh one at the main menu.
    async fn get_or_create(&self, id: &str, phone_number: &str) -> Result<Session>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    /// Upsert `session`, refreshing its access time.
    async fn save(&self, session: Session) -> Result<()>;
    /// Removing an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
    /// Drop every session idle for longer than `ttl` as of `now`, returning how many went.
    async fn sweep_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize>;
    async fn len(&self) -> Result<usize>;
}

/// In-memory implementation of SessionStorage
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn get_or_create(&self, id: &str, phone_number: &str) -> Result<Session> {
        let now = Utc::now();
        let entry = self
            .sessions
            .entry(id.to_string())
            .and_modify(|session| session.last_accessed_at = now)
            .or_insert_with(|| {
                debug!(session_id = %id, "Creating new session");
                Session::new(id, phone_number)
            });
        Ok(entry.value().clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn save(&self, mut session: Session) -> Result<()> {
        session.last_accessed_at = Utc::now();
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize> {
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let expired = session.is_expired(now, ttl);
            if expired {
                removed += 1;
            }
            !expired
        });
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.sessions.len())
    }
}

/// Spawn the background task that sweeps idle sessions every `period`.
///
/// The task runs until the returned handle is aborted or the runtime shuts down.
pub fn spawn_session_sweeper(
    storage: Arc<dyn SessionStorage>,
    period: std::time::Duration,
    ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match storage.sweep_expired(Utc::now(), ttl).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Swept expired sessions"),
                Err(e) => error!(error = %e, "Failed to sweep expired sessions"),
            }
        }
    })
}
