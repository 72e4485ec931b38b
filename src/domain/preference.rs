//! Per-user preference record.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Assistant preferences for a single user. One row per user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPreference {
    pub id: i64,
    pub user_id: i64,
    pub language: String,
    pub tts_voice: String,
    pub auto_reply_enabled: bool,
    pub conversation_timeout_secs: i32,
    pub notification_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
