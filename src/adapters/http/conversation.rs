//! Conversation endpoint.
//!
//! Verifies the user, runs the conversation orchestrator, persists the audit
//! row, and only then answers. A reply that failed validation is never
//! persisted.

use std::time::Instant;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{bad_request, internal_error, not_found, service_unavailable, AppState};
use crate::application::ConversationError;
use crate::domain::ConversationLog;
use crate::ports::NewConversationLog;

/// Processing slower than this logs a warning.
const SLOW_REQUEST_MS: f64 = 2_000.0;

const MAX_INPUT_CHARS: usize = 5_000;

// ════════════════════════════════════════════════════════════════════════════
// DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationRequest {
    pub user_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationResponse {
    pub id: i64,
    pub user_id: i64,
    pub input_text: String,
    pub reply_text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub processing_time_ms: f64,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
}

impl From<ConversationLog> for ConversationResponse {
    fn from(log: ConversationLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            input_text: log.input_text,
            reply_text: log.reply_text,
            input_tokens: log.input_tokens,
            output_tokens: log.output_tokens,
            processing_time_ms: log.processing_time_ms,
            model_used: log.model_used,
            created_at: log.created_at,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handler
// ════════════════════════════════════════════════════════════════════════════

/// POST /conversation
async fn process_conversation(
    State(state): State<AppState>,
    Json(req): Json<ConversationRequest>,
) -> Response {
    if req.text.is_empty() || req.text.chars().count() > MAX_INPUT_CHARS {
        return bad_request("text must be 1 to 5000 characters");
    }

    let started = Instant::now();

    match state.users.get(req.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found("User not found"),
        Err(err) => {
            error!(error = %err, "failed to check user");
            return internal_error("Error processing conversation");
        }
    }

    let outcome = match state.conversation.converse(&req.text).await {
        Ok(outcome) => outcome,
        Err(ConversationError::Provider(err)) => {
            error!(error = %err, "provider failure during conversation");
            return service_unavailable();
        }
        Err(ConversationError::UnreasonableReply) => {
            error!("conversation reply failed validation, nothing persisted");
            return internal_error("Error processing conversation");
        }
    };

    let total_ms = started.elapsed().as_secs_f64() * 1000.0;
    if total_ms > SLOW_REQUEST_MS {
        warn!(elapsed_ms = total_ms, "conversation processing was slow");
    }

    let entry = NewConversationLog {
        user_id: req.user_id,
        input_text: req.text,
        reply_text: outcome.response_text,
        input_tokens: outcome.input_tokens as i32,
        output_tokens: outcome.output_tokens as i32,
        processing_time_ms: outcome.processing_time_ms,
        model_used: outcome.model_used,
    };

    match state.conversation_logs.create(entry).await {
        Ok(log) => {
            info!(
                user_id = log.user_id,
                elapsed_ms = total_ms,
                "conversation processed"
            );
            Json(ConversationResponse::from(log)).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to persist conversation log");
            internal_error("Error processing conversation")
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(process_conversation))
}
