//! SMS triage endpoint.

use std::time::Instant;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{bad_request, internal_error, not_found, service_unavailable, AppState};
use crate::domain::{SmsDecisionKind, SmsLog};
use crate::ports::NewSmsLog;

/// Processing slower than this logs a warning.
const SLOW_REQUEST_MS: f64 = 2_000.0;

const MAX_INPUT_CHARS: usize = 1_000;

// ════════════════════════════════════════════════════════════════════════════
// DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct SmsDecisionRequest {
    pub user_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmsDecisionResponse {
    pub id: i64,
    pub user_id: i64,
    pub incoming_text: String,
    pub decision: SmsDecisionKind,
    pub reply_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<SmsLog> for SmsDecisionResponse {
    fn from(log: SmsLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            incoming_text: log.incoming_text,
            decision: log.decision,
            reply_text: log.reply_text,
            created_at: log.created_at,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handler
// ════════════════════════════════════════════════════════════════════════════

/// POST /sms/decision
async fn make_sms_decision(
    State(state): State<AppState>,
    Json(req): Json<SmsDecisionRequest>,
) -> Response {
    if req.text.is_empty() || req.text.chars().count() > MAX_INPUT_CHARS {
        return bad_request("text must be 1 to 1000 characters");
    }

    let started = Instant::now();

    match state.users.get(req.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found("User not found"),
        Err(err) => {
            error!(error = %err, "failed to check user");
            return internal_error("Error processing SMS decision");
        }
    }

    let decision = match state.sms_decision.decide(&req.text).await {
        Ok(decision) => decision,
        Err(err) => {
            error!(error = %err, "provider failure during sms decision");
            return service_unavailable();
        }
    };

    let total_ms = started.elapsed().as_secs_f64() * 1000.0;
    if total_ms > SLOW_REQUEST_MS {
        warn!(elapsed_ms = total_ms, "sms decision was slow");
    }

    let entry = NewSmsLog {
        user_id: req.user_id,
        incoming_text: req.text,
        decision: decision.decision,
        reply_text: decision.reply_text,
    };

    match state.sms_logs.create(entry).await {
        Ok(log) => {
            info!(
                user_id = log.user_id,
                decision = log.decision.as_str(),
                elapsed_ms = total_ms,
                "sms decision made"
            );
            Json(SmsDecisionResponse::from(log)).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to persist sms log");
            internal_error("Error processing SMS decision")
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/decision", post(make_sms_decision))
}
