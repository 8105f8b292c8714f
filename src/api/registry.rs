//! Conversation id to session mapping for the HTTP host.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::session::{Session, SessionFactory};

/// Default time a conversation may sit unused before it is dropped.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry {
    session: Arc<Mutex<Session>>,
    last_used: Instant,
}

/// Sessions keyed by conversation id, created lazily and dropped when idle.
///
/// Each session sits behind its own mutex, so two requests for the same
/// conversation queue instead of interleaving.
pub struct SessionRegistry {
    factory: SessionFactory,
    sessions: Mutex<HashMap<String, Entry>>,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(factory: SessionFactory) -> Self {
        Self {
            factory,
            sessions: Mutex::new(HashMap::new()),
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }

    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = ttl;
        self
    }

    pub fn factory(&self) -> &SessionFactory {
        &self.factory
    }

    /// The session for `id`, creating it (and an id when none is given).
    pub async fn get_or_create(&self, id: Option<String>) -> (String, Arc<Mutex<Session>>) {
        let id = id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        Self::sweep_locked(&mut sessions, self.idle_ttl, now);
        let entry = sessions.entry(id.clone()).or_insert_with(|| {
            log::debug!("new conversation {id}");
            Entry {
                session: Arc::new(Mutex::new(self.factory.create())),
                last_used: now,
            }
        });
        entry.last_used = now;
        (id, entry.session.clone())
    }

    /// The session for an existing conversation.
    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        let mut sessions = self.sessions.lock().await;
        sessions.get_mut(id).map(|entry| {
            entry.last_used = Instant::now();
            entry.session.clone()
        })
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.lock().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Drops conversations idle for longer than the TTL; returns how many.
    pub async fn sweep_idle(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        Self::sweep_locked(&mut sessions, self.idle_ttl, Instant::now())
    }

    fn sweep_locked(sessions: &mut HashMap<String, Entry>, ttl: Duration, now: Instant) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_used) <= ttl);
        let dropped = before - sessions.len();
        if dropped > 0 {
            log::debug!("dropped {dropped} idle conversations");
        }
        dropped
    }
}
