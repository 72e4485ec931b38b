//! Append-only audit log entities.
//!
//! One row is written per completed request; rows are never mutated or
//! deleted, and retrieval is always newest-first per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit row for one conversation exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationLog {
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

/// Audit row for one outbound call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallLog {
    pub id: i64,
    pub user_id: i64,
    pub call_duration_seconds: f64,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The yes/no triage outcome for an incoming SMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsDecisionKind {
    Yes,
    No,
}

impl SmsDecisionKind {
    /// Stable wire/storage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SmsDecisionKind::Yes => "yes",
            SmsDecisionKind::No => "no",
        }
    }
}

/// Audit row for one SMS triage decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmsLog {
    pub id: i64,
    pub user_id: i64,
    pub incoming_text: String,
    pub decision: SmsDecisionKind,
    pub reply_text: String,
    pub created_at: DateTime<Utc>,
}
