use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use llmgw_common::RepoError;
use llmgw_domain::{Model, ModelRepository};

use crate::cache::TtlCache;

#[derive(Clone)]
struct ModelEntry {
    model: Model,
    expires_at: Instant,
}

impl ModelEntry {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Model registry with TTL'd item and list caches in front of
/// [`ModelRepository`], using a clone/mutate/store idiom over
/// `ArcSwap<HashMap<...>>` with a per-entry `expires_at` so a read can
/// detect staleness without waiting for an explicit write.
pub struct ModelCache {
    repo: Arc<dyn ModelRepository>,
    items: ArcSwap<HashMap<String, ModelEntry>>,
    list: TtlCache<Arc<Vec<Model>>>,
    item_ttl: Duration,
}

impl ModelCache {
    pub fn new(repo: Arc<dyn ModelRepository>, item_ttl: Duration, list_ttl: Duration) -> Self {
        Self {
            repo,
            items: ArcSwap::from_pointee(HashMap::new()),
            list: TtlCache::new(list_ttl),
            item_ttl,
        }
    }

    /// Resolves a single model by id, refreshing from the repository on a
    /// cache miss or expired entry.
    pub async fn get(&self, id: &str) -> Result<Model, RepoError> {
        if let Some(entry) = self.items.load().get(id) {
            if entry.is_fresh() {
                return Ok(entry.model.clone());
            }
        }

        let model = self.repo.get(id).await?;
        let mut map = self.items.load().as_ref().clone();
        map.insert(
            id.to_string(),
            ModelEntry {
                model: model.clone(),
                expires_at: Instant::now() + self.item_ttl,
            },
        );
        self.items.store(Arc::new(map));
        Ok(model)
    }

    /// Resolves the full enabled-model set, refreshing the single `"all"`
    /// list entry on a miss or expiry.
    pub async fn list_enabled(&self) -> Result<Arc<Vec<Model>>, RepoError> {
        if let Some(models) = self.list.get() {
            return Ok(models);
        }
        let models = Arc::new(self.repo.list_enabled().await?);
        self.list.store(models.clone());
        Ok(models)
    }

    /// Write-invalidation: a model create/update/enable-toggle clears both
    /// caches unconditionally rather than waiting out the TTL.
    pub fn invalidate(&self, id: &str) {
        let mut map = self.items.load().as_ref().clone();
        map.remove(id);
        self.items.store(Arc::new(map));
        self.list.invalidate();
    }

    pub fn invalidate_all(&self) {
        self.items.store(Arc::new(HashMap::new()));
        self.list.invalidate();
    }
}
