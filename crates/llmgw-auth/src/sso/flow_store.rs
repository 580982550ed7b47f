use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Per-flow PKCE/organization-binding state for the authorization-code
/// flow, keyed by the single-use `state` nonce. An instance field rather
/// than a process-wide static so multiple `SsoHandler`s (e.g. under test)
/// do not share state.
pub struct AuthCodeFlowStore {
    entries: Mutex<HashMap<String, AuthCodeFlowEntry>>,
    ttl: Duration,
}

#[derive(Clone)]
struct AuthCodeFlowEntry {
    code_verifier: String,
    organization_id: Option<i64>,
    created_at: Instant,
}

impl AuthCodeFlowStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn insert(&self, state: String, code_verifier: String, organization_id: Option<i64>) {
        self.entries.lock().insert(
            state,
            AuthCodeFlowEntry {
                code_verifier,
                organization_id,
                created_at: Instant::now(),
            },
        );
    }

    /// Removes and returns the entry if present and not expired. A single
    /// lookup both consumes the entry (single-use nonce) and enforces TTL.
    pub fn take(&self, state: &str) -> Option<(String, Option<i64>)> {
        let mut guard = self.entries.lock();
        let entry = guard.remove(state)?;
        if entry.created_at.elapsed() > self.ttl {
            return None;
        }
        Some((entry.code_verifier, entry.organization_id))
    }
}
