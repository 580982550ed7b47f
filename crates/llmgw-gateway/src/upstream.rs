use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use http::StatusCode;
use llmgw_domain::OpenRouterCredential;
use llmgw_usage::TokenUsage;
use serde_json::Value;

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// The upstream LLM client, concrete against OpenRouter's
/// OpenAI-compatible `/chat/completions` endpoint. Uses `reqwest` with a
/// unary/streaming split (noted in DESIGN.md).
pub struct UpstreamClient {
    http: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub struct UnaryResponse {
    pub status: StatusCode,
    pub body: Bytes,
    pub usage: Option<TokenUsage>,
}

impl UpstreamClient {
    pub fn new(request_timeout: Duration, outbound_proxy: Option<&str>) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder().timeout(request_timeout);
        if let Some(proxy_url) = outbound_proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    /// Unary dispatch: POSTs the full request body (with `model` already
    /// rewritten to the upstream model reference) and reads the whole
    /// response before returning, extracting `usage` from the JSON body if
    /// present.
    pub async fn generate(
        &self,
        credential: &OpenRouterCredential,
        body: Value,
    ) -> Result<UnaryResponse, UpstreamError> {
        let resp = self
            .http
            .post(format!("{OPENROUTER_BASE_URL}/chat/completions"))
            .bearer_auth(&credential.api_key)
            .headers(referer_headers(credential))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        let usage = serde_json::from_slice::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(usage_from_json);

        Ok(UnaryResponse {
            status,
            body,
            usage,
        })
    }

    /// Streaming dispatch: returns the upstream status plus a stream of raw
    /// SSE byte chunks. The caller inspects each decoded chunk for a
    /// terminal `finish_reason` or trailing `usage` object.
    pub async fn generate_stream(
        &self,
        credential: &OpenRouterCredential,
        body: Value,
    ) -> Result<(StatusCode, impl Stream<Item = reqwest::Result<Bytes>>), UpstreamError> {
        let resp = self
            .http
            .post(format!("{OPENROUTER_BASE_URL}/chat/completions"))
            .bearer_auth(&credential.api_key)
            .headers(referer_headers(credential))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        Ok((status, resp.bytes_stream()))
    }
}

fn referer_headers(credential: &OpenRouterCredential) -> http::HeaderMap {
    let mut headers = http::HeaderMap::new();
    if let Some(referer) = &credential.http_referer {
        if let Ok(value) = http::HeaderValue::from_str(referer) {
            headers.insert(http::header::REFERER, value);
        }
    }
    if let Some(site_name) = &credential.site_name {
        if let Ok(value) = http::HeaderValue::from_str(site_name) {
            headers.insert("x-title", value);
        }
    }
    headers
}

/// Extracts `{prompt_tokens, completion_tokens, ...}` from an OpenAI-shaped
/// `usage` object. Returns `None` if the field is absent, which the
/// pending registry treats as "no provider usage yet".
pub fn usage_from_json(value: &Value) -> Option<TokenUsage> {
    let usage = value.get("usage")?;
    let input_tokens = usage.get("prompt_tokens")?.as_i64()?;
    let output_tokens = usage.get("completion_tokens")?.as_i64()?;
    let cached_tokens = usage
        .get("prompt_tokens_details")
        .and_then(|d| d.get("cached_tokens"))
        .and_then(|v| v.as_i64());
    let reasoning_tokens = usage
        .get("completion_tokens_details")
        .and_then(|d| d.get("reasoning_tokens"))
        .and_then(|v| v.as_i64());
    Some(TokenUsage {
        input_tokens,
        output_tokens,
        cached_tokens,
        reasoning_tokens,
    })
}

/// True once a streamed chunk's first choice carries a non-null
/// `finish_reason`, the point at which the pending registry's update hook
/// should fire.
pub fn chunk_is_final(value: &Value) -> bool {
    value
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("finish_reason"))
        .is_some_and(|reason| !reason.is_null())
}

/// Splits a buffered SSE byte chunk into `data: ...` JSON payloads, skipping
/// the `[DONE]` sentinel line.
pub fn parse_sse_data_lines(chunk: &[u8]) -> Vec<Value> {
    let text = String::from_utf8_lossy(chunk);
    text.lines()
        .filter_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        .map(str::trim)
        .filter(|payload| *payload != "[DONE]" && !payload.is_empty())
        .filter_map(|payload| serde_json::from_str(payload).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_from_json_reads_prompt_and_completion_tokens() {
        let value: Value = serde_json::json!({
            "usage": {"prompt_tokens": 100, "completion_tokens": 50}
        });
        let usage = usage_from_json(&value).unwrap();
        assert_eq!(usage.input_tokens, 100);
        assert_eq!(usage.output_tokens, 50);
    }

    #[test]
    fn usage_from_json_missing_field_is_none() {
        let value: Value = serde_json::json!({});
        assert!(usage_from_json(&value).is_none());
    }

    #[test]
    fn chunk_is_final_detects_finish_reason() {
        let chunk: Value = serde_json::json!({
            "choices": [{"finish_reason": "stop"}]
        });
        assert!(chunk_is_final(&chunk));
        let unfinished: Value = serde_json::json!({
            "choices": [{"finish_reason": null}]
        });
        assert!(!chunk_is_final(&unfinished));
    }

    #[test]
    fn parse_sse_data_lines_skips_done_sentinel() {
        let raw = b"data: {\"choices\":[{\"finish_reason\":null}]}\n\ndata: [DONE]\n\n";
        let values = parse_sse_data_lines(raw);
        assert_eq!(values.len(), 1);
    }
}
