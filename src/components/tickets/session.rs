//! Sessions des assistants de configuration
//!
//! Une session par couple (serveur, membre). Elle vit le temps d'une suite
//! d'interactions et expire si elle est abandonnée.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use serenity::{
    async_trait,
    model::id::{GuildId, UserId},
};
use tokio::sync::Mutex;

use super::wizard::Draft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub guild_id: GuildId,
    pub user_id: UserId,
}

impl SessionKey {
    pub fn new(guild_id: GuildId, user_id: UserId) -> Self {
        Self { guild_id, user_id }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: SessionKey) -> Option<Draft>;
    /// Remplace la session existante.
    async fn put(&self, key: SessionKey, draft: Draft);
    async fn remove(&self, key: SessionKey) -> Option<Draft>;
    /// Supprime les sessions expirées et renvoie leur nombre.
    async fn purge_expired(&self) -> usize;
}

struct Entry {
    draft: Draft,
    expires_at: Instant,
}

impl Entry {
    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Sessions gardées en mémoire avec une durée de vie
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<SessionKey, Entry>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: SessionKey) -> Option<Draft> {
        let sessions = self.sessions.lock().await;
        sessions.get(&key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.draft.clone())
    }
    async fn put(&self, key: SessionKey, draft: Draft) {
        let expires_at = Instant::now() + self.ttl;
        self.sessions.lock().await.insert(key, Entry { draft, expires_at });
    }
    async fn remove(&self, key: SessionKey) -> Option<Draft> {
        self.sessions.lock().await
            .remove(&key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.draft)
    }
    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now));
        before - sessions.len()
    }
}
