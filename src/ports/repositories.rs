//! Persistence gateway ports.
//!
//! Narrow create/read/list contracts over the five record kinds. Lookups
//! return `None` on miss rather than erroring; log listings are newest-first.
//! Each write is its own transaction; the core never needs cross-entity
//! transactions.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CallLog, ConversationLog, SmsDecisionKind, SmsLog, User, UserPreference};

/// Storage-layer failure, surfaced to handlers as a generic internal error.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid stored value: {0}")]
    Corrupt(String),
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
}

/// Partial update for a user; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError>;
    async fn get(&self, id: i64) -> Result<Option<User>, RepositoryError>;
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>, RepositoryError>;
    async fn update(&self, id: i64, changes: UserChanges)
        -> Result<Option<User>, RepositoryError>;
    /// Returns false when no row existed.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;
}

/// Fields required to create a preference row.
#[derive(Debug, Clone)]
pub struct NewPreferences {
    pub language: String,
    pub tts_voice: String,
    pub auto_reply_enabled: bool,
    pub conversation_timeout_secs: i32,
    pub notification_email: Option<String>,
}

impl Default for NewPreferences {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            tts_voice: "nova".to_string(),
            auto_reply_enabled: false,
            conversation_timeout_secs: 300,
            notification_email: None,
        }
    }
}

/// Partial update for preferences; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct PreferenceChanges {
    pub language: Option<String>,
    pub tts_voice: Option<String>,
    pub auto_reply_enabled: Option<bool>,
    pub conversation_timeout_secs: Option<i32>,
    pub notification_email: Option<String>,
}

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn create(
        &self,
        user_id: i64,
        prefs: NewPreferences,
    ) -> Result<UserPreference, RepositoryError>;
    async fn get(&self, id: i64) -> Result<Option<UserPreference>, RepositoryError>;
    async fn get_by_user(&self, user_id: i64)
        -> Result<Option<UserPreference>, RepositoryError>;
    async fn update(
        &self,
        id: i64,
        changes: PreferenceChanges,
    ) -> Result<Option<UserPreference>, RepositoryError>;
    /// Returns false when no row existed.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;
}

/// One finished conversation exchange, ready to persist.
#[derive(Debug, Clone)]
pub struct NewConversationLog {
    pub user_id: i64,
    pub input_text: String,
    pub reply_text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub processing_time_ms: f64,
    pub model_used: String,
}

#[async_trait]
pub trait ConversationLogRepository: Send + Sync {
    async fn create(&self, entry: NewConversationLog)
        -> Result<ConversationLog, RepositoryError>;
    async fn get(&self, id: i64) -> Result<Option<ConversationLog>, RepositoryError>;
    /// Newest first.
    async fn list_by_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ConversationLog>, RepositoryError>;
}

/// One finished outbound call, ready to persist.
#[derive(Debug, Clone)]
pub struct NewCallLog {
    pub user_id: i64,
    pub call_duration_seconds: f64,
    pub success: bool,
    pub error_message: Option<String>,
}

#[async_trait]
pub trait CallLogRepository: Send + Sync {
    async fn create(&self, entry: NewCallLog) -> Result<CallLog, RepositoryError>;
    async fn get(&self, id: i64) -> Result<Option<CallLog>, RepositoryError>;
    /// Newest first.
    async fn list_by_user(&self, user_id: i64, limit: i64)
        -> Result<Vec<CallLog>, RepositoryError>;
}

/// One finished SMS triage decision, ready to persist.
#[derive(Debug, Clone)]
pub struct NewSmsLog {
    pub user_id: i64,
    pub incoming_text: String,
    pub decision: SmsDecisionKind,
    pub reply_text: String,
}

#[async_trait]
pub trait SmsLogRepository: Send + Sync {
    async fn create(&self, entry: NewSmsLog) -> Result<SmsLog, RepositoryError>;
    async fn get(&self, id: i64) -> Result<Option<SmsLog>, RepositoryError>;
    /// Newest first.
    async fn list_by_user(&self, user_id: i64, limit: i64)
        -> Result<Vec<SmsLog>, RepositoryError>;
}
