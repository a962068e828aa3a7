// In-memory HTTP session store
// Sessions are identified by a UUID carried in the session cookie and expire after an idle timeout

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::Model;

/// A request's working copy of a session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub attributes: Model,
    /// True when the session was created for this request and the cookie must be sent
    pub is_new: bool,
    /// Attributes as loaded, to find what this request changed
    loaded: Model,
}

impl Session {
    fn new(id: String, attributes: Model, is_new: bool) -> Self {
        Self {
            id,
            loaded: attributes.clone(),
            attributes,
            is_new,
        }
    }

    /// Attributes added or replaced since the session was loaded
    fn changed(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes
            .iter()
            .filter(|(key, value)| self.loaded.get(key) != Some(*value))
    }
}

#[derive(Debug)]
struct StoredSession {
    attributes: Model,
    last_accessed: Instant,
}

impl StoredSession {
    fn is_expired(&self, timeout: Duration, now: Instant) -> bool {
        now.duration_since(self.last_accessed) >= timeout
    }
}

/// Session registry shared by all connections
pub struct SessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Look up the session named by `id`, or start a new one.
    ///
    /// Expired sessions are purged while the write lock is held.
    pub async fn load_or_create(&self, id: Option<&str>) -> Session {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if let Some(id) = id {
            if let Some(stored) = sessions.get_mut(id) {
                if !stored.is_expired(self.timeout, now) {
                    stored.last_accessed = now;
                    return Session::new(id.to_string(), stored.attributes.clone(), false);
                }
            }
        }

        let timeout = self.timeout;
        sessions.retain(|_, s| !s.is_expired(timeout, now));

        let id = Uuid::new_v4().simple().to_string().to_uppercase();
        sessions.insert(
            id.clone(),
            StoredSession {
                attributes: Model::new(),
                last_accessed: now,
            },
        );

        Session::new(id, Model::new(), true)
    }

    /// Merge the attributes this request changed into the stored session.
    ///
    /// Keys the request left alone keep whatever an overlapping request wrote.
    pub async fn save(&self, session: &Session) {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .entry(session.id.clone())
            .or_insert_with(|| StoredSession {
                attributes: Model::new(),
                last_accessed: Instant::now(),
            });
        for (key, value) in session.changed() {
            stored.attributes.insert_value(key.clone(), value.clone());
        }
        stored.last_accessed = Instant::now();
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;

    #[tokio::test]
    async fn test_create_then_reload() {
        let store = SessionStore::new(Duration::from_secs(60));
        let mut session = store.load_or_create(None).await;
        assert!(session.is_new);
        assert_eq!(session.id.len(), 32);

        session.attributes.insert("school", "atguigu").unwrap();
        store.save(&session).await;

        let again = store.load_or_create(Some(&session.id)).await;
        assert!(!again.is_new);
        assert_eq!(again.id, session.id);
        assert_eq!(
            again.attributes.get_as::<String>("school").unwrap().as_deref(),
            Some("atguigu")
        );
    }

    #[tokio::test]
    async fn test_overlapping_requests_keep_both_attributes() {
        let store = SessionStore::new(Duration::from_secs(60));
        let created = store.load_or_create(None).await;
        store.save(&created).await;

        let mut first = store.load_or_create(Some(&created.id)).await;
        let mut second = store.load_or_create(Some(&created.id)).await;
        first
            .attributes
            .insert("user", &User::new("Tom", "123456", "tom@qq.com", 15))
            .unwrap();
        second.attributes.insert("school", "atguigu").unwrap();
        store.save(&first).await;
        store.save(&second).await;

        let merged = store.load_or_create(Some(&created.id)).await;
        assert!(merged.attributes.contains("user"));
        assert!(merged.attributes.contains("school"));
    }

    #[tokio::test]
    async fn test_unchanged_attribute_does_not_overwrite() {
        let store = SessionStore::new(Duration::from_secs(60));
        let mut created = store.load_or_create(None).await;
        created.attributes.insert("school", "atguigu").unwrap();
        store.save(&created).await;

        let stale = store.load_or_create(Some(&created.id)).await;
        let mut fresh = store.load_or_create(Some(&created.id)).await;
        fresh.attributes.insert("school", "pku").unwrap();
        store.save(&fresh).await;
        store.save(&stale).await;

        let after = store.load_or_create(Some(&created.id)).await;
        assert_eq!(
            after.attributes.get_as::<String>("school").unwrap().as_deref(),
            Some("pku")
        );
    }

    #[tokio::test]
    async fn test_unknown_id_starts_new_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.load_or_create(Some("NOPE")).await;
        assert!(session.is_new);
        assert_ne!(session.id, "NOPE");
    }

    #[tokio::test]
    async fn test_expired_sessions_are_purged() {
        let store = SessionStore::new(Duration::ZERO);
        let first = store.load_or_create(None).await;
        let second = store.load_or_create(Some(&first.id)).await;

        assert!(second.is_new);
        assert_ne!(second.id, first.id);
        assert_eq!(store.len().await, 1);
    }
}
