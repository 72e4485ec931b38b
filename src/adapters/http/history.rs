//! History endpoints - aggregated and per-kind audit log retrieval.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::conversation::ConversationResponse;
use super::sms::SmsDecisionResponse;
use super::{internal_error, not_found, AppState};
use crate::domain::CallLog;

// ════════════════════════════════════════════════════════════════════════════
// DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    50
}

#[derive(Debug, Clone, Serialize)]
pub struct CallLogResponse {
    pub id: i64,
    pub user_id: i64,
    pub call_duration_seconds: f64,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CallLog> for CallLogResponse {
    fn from(log: CallLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            call_duration_seconds: log.call_duration_seconds,
            success: log.success,
            error_message: log.error_message,
            created_at: log.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub conversation_logs: Vec<ConversationResponse>,
    pub call_logs: Vec<CallLogResponse>,
    pub sms_logs: Vec<SmsDecisionResponse>,
}

// ════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════

async fn user_exists(state: &AppState, user_id: i64) -> Result<bool, Response> {
    match state.users.get(user_id).await {
        Ok(Some(_)) => Ok(true),
        Ok(None) => Ok(false),
        Err(err) => {
            error!(error = %err, user_id, "failed to check user");
            Err(internal_error("Error retrieving history"))
        }
    }
}

/// GET /history/:user_id - all three log kinds in one shot.
async fn get_user_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Response {
    match user_exists(&state, user_id).await {
        Ok(true) => {}
        Ok(false) => return not_found("User not found"),
        Err(response) => return response,
    }

    let conversations = state
        .conversation_logs
        .list_by_user(user_id, params.limit)
        .await;
    let calls = state.call_logs.list_by_user(user_id, params.limit).await;
    let sms = state.sms_logs.list_by_user(user_id, params.limit).await;

    match (conversations, calls, sms) {
        (Ok(conversations), Ok(calls), Ok(sms)) => {
            info!(
                user_id,
                conversations = conversations.len(),
                calls = calls.len(),
                sms = sms.len(),
                "history retrieved"
            );
            Json(HistoryResponse {
                conversation_logs: conversations
                    .into_iter()
                    .map(ConversationResponse::from)
                    .collect(),
                call_logs: calls.into_iter().map(CallLogResponse::from).collect(),
                sms_logs: sms.into_iter().map(SmsDecisionResponse::from).collect(),
            })
            .into_response()
        }
        _ => internal_error("Error retrieving history"),
    }
}

/// GET /history/:user_id/conversations
async fn get_conversation_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Response {
    match user_exists(&state, user_id).await {
        Ok(true) => {}
        Ok(false) => return not_found("User not found"),
        Err(response) => return response,
    }

    match state
        .conversation_logs
        .list_by_user(user_id, params.limit)
        .await
    {
        Ok(logs) => {
            let body: Vec<ConversationResponse> =
                logs.into_iter().map(ConversationResponse::from).collect();
            Json(body).into_response()
        }
        Err(err) => {
            error!(error = %err, user_id, "failed to list conversation history");
            internal_error("Error retrieving conversation history")
        }
    }
}

/// GET /history/:user_id/calls
async fn get_call_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Response {
    match user_exists(&state, user_id).await {
        Ok(true) => {}
        Ok(false) => return not_found("User not found"),
        Err(response) => return response,
    }

    match state.call_logs.list_by_user(user_id, params.limit).await {
        Ok(logs) => {
            let body: Vec<CallLogResponse> =
                logs.into_iter().map(CallLogResponse::from).collect();
            Json(body).into_response()
        }
        Err(err) => {
            error!(error = %err, user_id, "failed to list call history");
            internal_error("Error retrieving call history")
        }
    }
}

/// GET /history/:user_id/sms
async fn get_sms_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Response {
    match user_exists(&state, user_id).await {
        Ok(true) => {}
        Ok(false) => return not_found("User not found"),
        Err(response) => return response,
    }

    match state.sms_logs.list_by_user(user_id, params.limit).await {
        Ok(logs) => {
            let body: Vec<SmsDecisionResponse> =
                logs.into_iter().map(SmsDecisionResponse::from).collect();
            Json(body).into_response()
        }
        Err(err) => {
            error!(error = %err, user_id, "failed to list sms history");
            internal_error("Error retrieving SMS history")
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(get_user_history))
        .route("/:user_id/conversations", get(get_conversation_history))
        .route("/:user_id/calls", get(get_call_history))
        .route("/:user_id/sms", get(get_sms_history))
}
