use llmgw_domain::FailureStage;

/// Maps an HTTP status observed at the middleware's exit point to the
/// `(errorType, failureStage)` pair recorded on a usage event that never
/// received a provider-side update.
pub fn classify_http_failure(status: u16) -> (&'static str, FailureStage) {
    match status {
        401 | 403 => ("auth_error", FailureStage::PreGeneration),
        429 => ("rate_limit", FailureStage::PreGeneration),
        500..=599 => ("server_error", FailureStage::DuringGeneration),
        _ => ("http_error", FailureStage::PreGeneration),
    }
}
