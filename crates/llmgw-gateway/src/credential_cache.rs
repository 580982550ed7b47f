use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use llmgw_common::RepoError;
use llmgw_domain::{CredentialRepository, OpenRouterCredential};

#[derive(Clone)]
struct CredentialEntry {
    credential: OpenRouterCredential,
    expires_at: Instant,
}

impl CredentialEntry {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// The credential store, cached the same way as [`crate::model_cache::ModelCache`]:
/// a TTL'd `ArcSwap<HashMap<...>>` of items, no list cache (credentials are
/// always looked up by id, never enumerated on the request path).
pub struct CredentialCache {
    repo: Arc<dyn CredentialRepository>,
    items: ArcSwap<HashMap<i64, CredentialEntry>>,
    ttl: Duration,
}

impl CredentialCache {
    pub fn new(repo: Arc<dyn CredentialRepository>, ttl: Duration) -> Self {
        Self {
            repo,
            items: ArcSwap::from_pointee(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, id: i64) -> Result<OpenRouterCredential, RepoError> {
        if let Some(entry) = self.items.load().get(&id) {
            if entry.is_fresh() {
                return Ok(entry.credential.clone());
            }
        }

        let credential = self.repo.get(id).await?;
        let mut map = self.items.load().as_ref().clone();
        map.insert(
            id,
            CredentialEntry {
                credential: credential.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        self.items.store(Arc::new(map));
        Ok(credential)
    }

    pub fn invalidate(&self, id: i64) {
        let mut map = self.items.load().as_ref().clone();
        map.remove(&id);
        self.items.store(Arc::new(map));
    }

    pub fn invalidate_all(&self) {
        self.items.store(Arc::new(HashMap::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct CountingRepo {
        calls: Mutex<u32>,
        credential: OpenRouterCredential,
    }

    #[async_trait]
    impl CredentialRepository for CountingRepo {
        async fn get(&self, _id: i64) -> Result<OpenRouterCredential, RepoError> {
            *self.calls.lock() += 1;
            Ok(self.credential.clone())
        }
        async fn list_enabled(&self) -> Result<Vec<OpenRouterCredential>, RepoError> {
            Ok(vec![self.credential.clone()])
        }
        async fn create(
            &self,
            credential: OpenRouterCredential,
        ) -> Result<OpenRouterCredential, RepoError> {
            Ok(credential)
        }
        async fn update(
            &self,
            credential: OpenRouterCredential,
        ) -> Result<OpenRouterCredential, RepoError> {
            Ok(credential)
        }
        async fn set_enabled(&self, _id: i64, _enabled: bool) -> Result<(), RepoError> {
            Ok(())
        }
    }

    fn sample() -> OpenRouterCredential {
        OpenRouterCredential {
            id: 1,
            name: "primary".to_string(),
            description: None,
            api_key: "sk-or-v1-test".to_string(),
            site_name: None,
            http_referer: None,
            enabled: true,
        }
    }

    #[tokio::test]
    async fn repeated_get_hits_cache() {
        let repo = Arc::new(CountingRepo {
            calls: Mutex::new(0),
            credential: sample(),
        });
        let cache = CredentialCache::new(repo.clone(), Duration::from_secs(60));
        cache.get(1).await.unwrap();
        cache.get(1).await.unwrap();
        assert_eq!(*repo.calls.lock(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let repo = Arc::new(CountingRepo {
            calls: Mutex::new(0),
            credential: sample(),
        });
        let cache = CredentialCache::new(repo.clone(), Duration::from_secs(60));
        cache.get(1).await.unwrap();
        cache.invalidate(1);
        cache.get(1).await.unwrap();
        assert_eq!(*repo.calls.lock(), 2);
    }
}
