use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use llmgw_domain::{Session, User};
use parking_lot::RwLock;
use rand::RngCore;
use time::{Duration, OffsetDateTime};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLookupError {
    NotFound,
    Expired,
}

/// In-memory map of opaque session identifiers to authenticated
/// principals. Single exclusive lock guards mutation; reads take a shared
/// lock. Process-wide only; a distributed deployment would substitute an
/// external implementation behind this same type's contract.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: StdDuration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::try_from(ttl).unwrap_or(Duration::hours(24)),
        }
    }

    pub fn create(&self, user: User) -> Session {
        let session = Session {
            id: generate_session_id(),
            user,
            created_at: OffsetDateTime::now_utc(),
            expires_at: OffsetDateTime::now_utc() + self.ttl,
        };
        self.sessions.write().insert(session.id.clone(), session.clone());
        session
    }

    /// Expiry enforced at read time with side-effecting delete.
    pub fn get(&self, id: &str) -> Result<Session, SessionLookupError> {
        let expired = {
            let guard = self.sessions.read();
            match guard.get(id) {
                None => return Err(SessionLookupError::NotFound),
                Some(session) => session.is_expired_at(OffsetDateTime::now_utc()),
            }
        };
        if expired {
            self.sessions.write().remove(id);
            return Err(SessionLookupError::Expired);
        }
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or(SessionLookupError::NotFound)
    }

    pub fn delete(&self, id: &str) {
        self.sessions.write().remove(id);
    }

    /// Removes every expired entry. Intended to run on a periodic timer
    /// (`session.cleanup_interval`, default 10 minutes).
    pub fn cleanup(&self) {
        let now = OffsetDateTime::now_utc();
        let mut guard = self.sessions.write();
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_at(now));
        let removed = before - guard.len();
        if removed > 0 {
            debug!(removed, "session cleanup swept expired entries");
        }
    }
}

/// Spawns the periodic expired-session sweep. Returns a handle the caller
/// can abort on shutdown.
pub fn spawn_cleanup_task(
    store: Arc<SessionStore>,
    interval: StdDuration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            store.cleanup();
        }
    })
}

/// At least 192 bits of entropy, opaque to callers.
fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmgw_domain::AuthProviderKind;

    fn sample_user() -> User {
        User {
            id: 1,
            email: "u1@example.com".to_string(),
            name: "U1".to_string(),
            organization_id: 1,
            external_id: None,
            provider: AuthProviderKind::None,
            system_admin: false,
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
        }
    }

    #[test]
    fn create_then_get_within_ttl_returns_same_user() {
        let store = SessionStore::new(StdDuration::from_secs(3600));
        let session = store.create(sample_user());
        let fetched = store.get(&session.id).unwrap();
        assert_eq!(fetched.user.id, session.user.id);
    }

    #[test]
    fn get_after_ttl_reports_expired_without_sweep() {
        let store = SessionStore::new(StdDuration::from_nanos(1));
        let session = store.create(sample_user());
        std::thread::sleep(StdDuration::from_millis(5));
        let err = store.get(&session.id).unwrap_err();
        assert_eq!(err, SessionLookupError::Expired);
    }

    #[test]
    fn deleted_session_is_not_found() {
        let store = SessionStore::new(StdDuration::from_secs(3600));
        let session = store.create(sample_user());
        store.delete(&session.id);
        assert_eq!(store.get(&session.id).unwrap_err(), SessionLookupError::NotFound);
    }

    #[test]
    fn cleanup_removes_expired_entries() {
        let store = SessionStore::new(StdDuration::from_nanos(1));
        let session = store.create(sample_user());
        std::thread::sleep(StdDuration::from_millis(5));
        store.cleanup();
        assert_eq!(store.sessions.read().get(&session.id), None);
    }
}
