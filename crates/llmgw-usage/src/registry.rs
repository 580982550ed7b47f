use std::collections::HashMap;

use llmgw_domain::{UsageDataSource, UsageEvent, UsageStatus};
use parking_lot::Mutex;
use time::OffsetDateTime;

use crate::classify::classify_http_failure;

#[derive(Clone, Debug, Default)]
pub struct TokenUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cached_tokens: Option<i64>,
    pub reasoning_tokens: Option<i64>,
}

struct PendingEntry {
    event: UsageEvent,
    provider_updated: bool,
}

/// Pending-event registry: one lock guards the in-flight draft for every
/// request that has entered the usage middleware but not yet been
/// finalized. Only the usage middleware and the tracked client mutate it.
pub struct PendingRegistry {
    entries: Mutex<HashMap<String, PendingEntry>>,
}

impl Default for PendingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Entry: opens a draft with `status=success`, `usageDataSource=unavailable`,
    /// `dataComplete=false`.
    pub fn open(&self, request_id: String, user_id: i64) {
        let event = UsageEvent {
            id: 0,
            request_id: request_id.clone(),
            user_id,
            model_id: None,
            input_tokens: None,
            output_tokens: None,
            cached_tokens: None,
            reasoning_tokens: None,
            status: UsageStatus::Success,
            failure_stage: None,
            error_type: None,
            error_message: None,
            usage_data_source: UsageDataSource::Unavailable,
            data_complete: false,
            timestamp: OffsetDateTime::now_utc(),
            duration_ms: None,
            input_cost_cents: None,
            output_cost_cents: None,
            total_cost_cents: None,
        };
        self.entries.lock().insert(
            request_id,
            PendingEntry {
                event,
                provider_updated: false,
            },
        );
    }

    /// Provider hook: merges model id, token usage, status, and duration
    /// into the draft. No-op if the request id is unknown (already
    /// finalized, or never opened).
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &self,
        request_id: &str,
        model_id: Option<String>,
        tokens: Option<TokenUsage>,
        status: UsageStatus,
        duration_ms: i64,
        is_streaming: bool,
    ) {
        let mut guard = self.entries.lock();
        let Some(entry) = guard.get_mut(request_id) else {
            return;
        };
        entry.event.model_id = model_id;
        entry.event.status = status;
        entry.event.duration_ms = Some(duration_ms);
        match tokens {
            Some(tokens) => {
                entry.event.input_tokens = Some(tokens.input_tokens);
                entry.event.output_tokens = Some(tokens.output_tokens);
                entry.event.cached_tokens = tokens.cached_tokens;
                entry.event.reasoning_tokens = tokens.reasoning_tokens;
                entry.event.data_complete = true;
                entry.event.usage_data_source = UsageDataSource::ProviderResponse;
            }
            None => {
                entry.event.data_complete = false;
                entry.event.usage_data_source = if is_streaming {
                    UsageDataSource::StreamingIncomplete
                } else {
                    UsageDataSource::Unavailable
                };
            }
        }
        entry.provider_updated = true;
    }

    /// A streamed response whose body closed or errored before the
    /// `finished=true` chunk arrived.
    pub fn mark_stream_failed(&self, request_id: &str, model_id: Option<String>, duration_ms: i64) {
        let mut guard = self.entries.lock();
        let Some(entry) = guard.get_mut(request_id) else {
            return;
        };
        entry.event.model_id = model_id;
        entry.event.status = UsageStatus::Failed;
        entry.event.failure_stage = Some(llmgw_domain::FailureStage::DuringGeneration);
        entry.event.usage_data_source = UsageDataSource::StreamingIncomplete;
        entry.event.data_complete = false;
        entry.event.duration_ms = Some(duration_ms);
        entry.provider_updated = true;
    }

    /// Exit: removes the draft and, if no provider update ever arrived,
    /// classifies a `>= 400` HTTP status into `errorType`/`failureStage`.
    /// Returns `None` if the request id is unknown — the caller must not
    /// enqueue in that case.
    pub fn finalize(&self, request_id: &str, http_status: u16, duration_ms: i64) -> Option<UsageEvent> {
        let mut entry = self.entries.lock().remove(request_id)?;
        if !entry.provider_updated {
            entry.event.duration_ms = Some(duration_ms);
            if http_status >= 400 {
                let (error_type, stage) = classify_http_failure(http_status);
                entry.event.status = UsageStatus::Failed;
                entry.event.error_type = Some(error_type.to_string());
                entry.event.failure_stage = Some(stage);
            }
        }
        Some(entry.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_without_update_classifies_failure() {
        let registry = PendingRegistry::new();
        registry.open("r1".to_string(), 1);
        let event = registry.finalize("r1", 429, 12).unwrap();
        assert_eq!(event.status, UsageStatus::Failed);
        assert_eq!(event.error_type.as_deref(), Some("rate_limit"));
        assert_eq!(event.duration_ms, Some(12));
    }

    #[test]
    fn finalize_after_provider_update_keeps_success() {
        let registry = PendingRegistry::new();
        registry.open("r1".to_string(), 1);
        registry.update(
            "r1",
            Some("m1".to_string()),
            Some(TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
                cached_tokens: None,
                reasoning_tokens: None,
            }),
            UsageStatus::Success,
            42,
            false,
        );
        let event = registry.finalize("r1", 200, 42).unwrap();
        assert_eq!(event.status, UsageStatus::Success);
        assert!(event.data_complete);
        assert_eq!(event.input_tokens, Some(100));
        assert_eq!(event.usage_data_source, UsageDataSource::ProviderResponse);
    }

    #[test]
    fn finalize_is_single_use() {
        let registry = PendingRegistry::new();
        registry.open("r1".to_string(), 1);
        assert!(registry.finalize("r1", 200, 1).is_some());
        assert!(registry.finalize("r1", 200, 1).is_none());
    }

    #[test]
    fn stream_failure_marks_during_generation() {
        let registry = PendingRegistry::new();
        registry.open("r1".to_string(), 1);
        registry.mark_stream_failed("r1", Some("m1".to_string()), 30);
        let event = registry.finalize("r1", 200, 30).unwrap();
        assert_eq!(event.status, UsageStatus::Failed);
        assert_eq!(
            event.failure_stage,
            Some(llmgw_domain::FailureStage::DuringGeneration)
        );
        assert!(!event.data_complete);
    }
}
