//! Chat Threads
//!
//! A session is one chat thread: its conversation history plus timestamps.
//! Callers address threads by an opaque string id (`thread_id` on the API).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use crate::message::{Conversation, Role};

/// Opaque thread identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    pub conversation: Conversation,

    pub created_at: DateTime<Utc>,

    /// Last turn on this thread
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation: Conversation::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// First user message, shortened, for listings
    pub fn title(&self) -> String {
        self.conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::User)
            .map_or_else(
                || format!("Thread {}", self.id.as_str().chars().take(8).collect::<String>()),
                |m| {
                    let preview: String = m.content.chars().take(50).collect();
                    if m.content.chars().count() > 50 {
                        format!("{preview}...")
                    } else {
                        preview
                    }
                },
            )
    }

    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Persistence for chat threads
pub trait SessionStore: Send + Sync {
    fn save(&self, session: &Session) -> crate::Result<()>;

    fn load(&self, id: &SessionId) -> crate::Result<Option<Session>>;

    fn delete(&self, id: &SessionId) -> crate::Result<()>;

    /// Most recently active first
    fn list(&self, limit: usize) -> crate::Result<Vec<Session>>;

    /// Load the thread or start a fresh one under the same id
    fn load_or_create(&self, id: &SessionId) -> crate::Result<Session> {
        Ok(self
            .load(id)?
            .unwrap_or_else(|| Session::with_id(id.clone())))
    }
}

/// In-process thread store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> crate::Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> crate::Result<Option<Session>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.get(id).cloned())
    }

    fn delete(&self, id: &SessionId) -> crate::Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(id);
        Ok(())
    }

    fn list(&self, limit: usize) -> crate::Result<Vec<Session>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let mut result: Vec<Session> = sessions.values().cloned().collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        result.truncate(limit);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn test_load_or_create_keeps_requested_id() {
        let store = MemorySessionStore::new();
        let id = SessionId::from_string("thread-42");

        let session = store.load_or_create(&id).unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.message_count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_reload_history() {
        let store = MemorySessionStore::new();
        let mut session = Session::new();
        session.conversation.push(Message::user("What about ETH?"));
        store.save(&session).unwrap();

        let loaded = store.load(&session.id).unwrap().unwrap();
        assert_eq!(loaded.message_count(), 1);
        assert_eq!(loaded.title(), "What about ETH?");

        store.delete(&session.id).unwrap();
        assert!(store.load(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_list_orders_by_activity() {
        let store = MemorySessionStore::new();
        let older = Session::new();
        let mut newer = Session::new();
        newer.updated_at = older.updated_at + chrono::Duration::seconds(5);
        store.save(&older).unwrap();
        store.save(&newer).unwrap();

        let listed = store.list(1).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, newer.id);
    }
}
