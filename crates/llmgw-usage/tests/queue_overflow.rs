//! A full queue must drop the overflow deterministically rather than
//! block the request path, and the surviving events must still persist
//! once the channel drains.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llmgw_common::RepoError;
use llmgw_domain::{UsageEvent, UsageQueryFilter, UsageRepository};
use llmgw_usage::UsageEngine;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingRepo {
    events: Mutex<Vec<UsageEvent>>,
}

#[async_trait]
impl UsageRepository for RecordingRepo {
    async fn append(&self, event: UsageEvent) -> Result<UsageEvent, RepoError> {
        self.events.lock().push(event.clone());
        Ok(event)
    }
    async fn query(&self, _filter: UsageQueryFilter) -> Result<Vec<UsageEvent>, RepoError> {
        Ok(self.events.lock().clone())
    }
    async fn update_cost_fields(
        &self,
        _id: i64,
        _input: llmgw_common::money::Cents,
        _output: llmgw_common::money::Cents,
        _total: llmgw_common::money::Cents,
    ) -> Result<(), RepoError> {
        Ok(())
    }
}

#[tokio::test]
async fn overflow_drops_exactly_the_excess_and_persists_the_rest() {
    let repo = Arc::new(RecordingRepo::default());
    let shutdown = CancellationToken::new();
    // The persister task is spawned but gets no chance to run until this
    // test function's first await, since the loop below never yields.
    // That makes the fill-then-drain split across the capacity boundary
    // exact rather than a race against the background task.
    let (engine, handle) = UsageEngine::spawn(repo.clone(), 2, Duration::from_secs(5), shutdown.clone());

    for i in 0..5 {
        let id = format!("r{i}");
        engine.open(&id, 1);
        engine.finalize_and_enqueue(&id, 200, 1);
    }

    assert_eq!(engine.dropped_count(), 3);

    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(repo.events.lock().len(), 2);
    assert_eq!(engine.dropped_count(), 3);
}
