use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use llmgw_domain::repo::UsageQueryFilter;
use llmgw_domain::UsageEvent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::ControlState;

#[derive(Deserialize)]
pub struct UsageRangeQuery {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    pub model_id: Option<String>,
}

#[derive(Deserialize)]
pub struct UsageDetailsQuery {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    pub model_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Serialize)]
pub struct UsageSummary {
    pub requests: u64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_cost_cents: Decimal,
}

pub async fn get_usage_summary(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Query(query): Query<UsageRangeQuery>,
) -> Result<Json<UsageSummary>, ApiError> {
    let events = state
        .usage
        .query(UsageQueryFilter {
            user_id: Some(caller.id),
            model_id: query.model_id,
            start: Some(query.start),
            end: Some(query.end),
            limit: None,
            offset: None,
        })
        .await?;
    Ok(Json(summarize(&events)))
}

pub async fn get_usage_details(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Query(query): Query<UsageDetailsQuery>,
) -> Result<Json<Vec<UsageEvent>>, ApiError> {
    let events = state
        .usage
        .query(UsageQueryFilter {
            user_id: Some(caller.id),
            model_id: query.model_id,
            start: Some(query.start),
            end: Some(query.end),
            limit: query.limit,
            offset: query.offset,
        })
        .await?;
    Ok(Json(events))
}

pub async fn get_usage_costs(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Query(query): Query<UsageRangeQuery>,
) -> Result<Json<UsageSummary>, ApiError> {
    get_usage_summary(State(state), CurrentUser(caller), Query(query)).await
}

/// Organization-wide usage breakdowns are not implemented; callers get a
/// clear signal rather than a silently wrong per-user fallback.
pub async fn get_organization_usage_summary(
    CurrentUser(_): CurrentUser,
    Path(_organization_id): Path<i64>,
) -> Result<Json<UsageSummary>, ApiError> {
    Err(ApiError::Unimplemented)
}

fn summarize(events: &[UsageEvent]) -> UsageSummary {
    let mut summary = UsageSummary {
        requests: events.len() as u64,
        input_tokens: 0,
        output_tokens: 0,
        total_cost_cents: Decimal::ZERO,
    };
    for event in events {
        summary.input_tokens += event.input_tokens.unwrap_or(0);
        summary.output_tokens += event.output_tokens.unwrap_or(0);
        if let Some(cost) = event.total_cost_cents {
            summary.total_cost_cents += cost;
        }
    }
    summary
}
