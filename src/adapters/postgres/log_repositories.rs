//! PostgreSQL implementations of the three audit-log repositories.
//!
//! All three are insert-and-read only; listing is newest-first per user.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::{CallLog, ConversationLog, SmsDecisionKind, SmsLog};
use crate::ports::{
    CallLogRepository, ConversationLogRepository, NewCallLog, NewConversationLog, NewSmsLog,
    RepositoryError, SmsLogRepository,
};

const CONVERSATION_COLUMNS: &str = "id, user_id, input_text, reply_text, input_tokens, \
                                    output_tokens, processing_time_ms, model_used, created_at";
const CALL_COLUMNS: &str = "id, user_id, call_duration_seconds, success, error_message, created_at";
const SMS_COLUMNS: &str = "id, user_id, incoming_text, decision, reply_text, created_at";

// ════════════════════════════════════════════════════════════════════════════
// Conversation logs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct PostgresConversationLogRepository {
    pool: PgPool,
}

impl PostgresConversationLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationLogRepository for PostgresConversationLogRepository {
    async fn create(
        &self,
        entry: NewConversationLog,
    ) -> Result<ConversationLog, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO conversation_logs \
                (user_id, input_text, reply_text, input_tokens, output_tokens, \
                 processing_time_ms, model_used) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {CONVERSATION_COLUMNS}"
        ))
        .bind(entry.user_id)
        .bind(&entry.input_text)
        .bind(&entry.reply_text)
        .bind(entry.input_tokens)
        .bind(entry.output_tokens)
        .bind(entry.processing_time_ms)
        .bind(&entry.model_used)
        .fetch_one(&self.pool)
        .await?;

        row_to_conversation_log(&row)
    }

    async fn get(&self, id: i64) -> Result<Option<ConversationLog>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversation_logs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_conversation_log).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ConversationLog>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversation_logs \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_conversation_log).collect()
    }
}

fn row_to_conversation_log(row: &PgRow) -> Result<ConversationLog, RepositoryError> {
    Ok(ConversationLog {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        input_text: row.try_get("input_text")?,
        reply_text: row.try_get("reply_text")?,
        input_tokens: row.try_get("input_tokens")?,
        output_tokens: row.try_get("output_tokens")?,
        processing_time_ms: row.try_get("processing_time_ms")?,
        model_used: row.try_get("model_used")?,
        created_at: row.try_get("created_at")?,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Call logs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct PostgresCallLogRepository {
    pool: PgPool,
}

impl PostgresCallLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallLogRepository for PostgresCallLogRepository {
    async fn create(&self, entry: NewCallLog) -> Result<CallLog, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO call_logs (user_id, call_duration_seconds, success, error_message) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {CALL_COLUMNS}"
        ))
        .bind(entry.user_id)
        .bind(entry.call_duration_seconds)
        .bind(entry.success)
        .bind(&entry.error_message)
        .fetch_one(&self.pool)
        .await?;

        row_to_call_log(&row)
    }

    async fn get(&self, id: i64) -> Result<Option<CallLog>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CALL_COLUMNS} FROM call_logs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_call_log).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<CallLog>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CALL_COLUMNS} FROM call_logs \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_call_log).collect()
    }
}

fn row_to_call_log(row: &PgRow) -> Result<CallLog, RepositoryError> {
    Ok(CallLog {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        call_duration_seconds: row.try_get("call_duration_seconds")?,
        success: row.try_get("success")?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// SMS logs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct PostgresSmsLogRepository {
    pool: PgPool,
}

impl PostgresSmsLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SmsLogRepository for PostgresSmsLogRepository {
    async fn create(&self, entry: NewSmsLog) -> Result<SmsLog, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO sms_logs (user_id, incoming_text, decision, reply_text) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SMS_COLUMNS}"
        ))
        .bind(entry.user_id)
        .bind(&entry.incoming_text)
        .bind(entry.decision.as_str())
        .bind(&entry.reply_text)
        .fetch_one(&self.pool)
        .await?;

        row_to_sms_log(&row)
    }

    async fn get(&self, id: i64) -> Result<Option<SmsLog>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {SMS_COLUMNS} FROM sms_logs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_sms_log).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<SmsLog>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SMS_COLUMNS} FROM sms_logs \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_sms_log).collect()
    }
}

fn str_to_decision(s: &str) -> Result<SmsDecisionKind, RepositoryError> {
    match s {
        "yes" => Ok(SmsDecisionKind::Yes),
        "no" => Ok(SmsDecisionKind::No),
        other => Err(RepositoryError::Corrupt(format!(
            "invalid sms decision: {other}"
        ))),
    }
}

fn row_to_sms_log(row: &PgRow) -> Result<SmsLog, RepositoryError> {
    let decision: String = row.try_get("decision")?;

    Ok(SmsLog {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        incoming_text: row.try_get("incoming_text")?,
        decision: str_to_decision(&decision)?,
        reply_text: row.try_get("reply_text")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_labels_round_trip() {
        assert_eq!(
            str_to_decision(SmsDecisionKind::Yes.as_str()).unwrap(),
            SmsDecisionKind::Yes
        );
        assert_eq!(
            str_to_decision(SmsDecisionKind::No.as_str()).unwrap(),
            SmsDecisionKind::No
        );
    }

    #[test]
    fn str_to_decision_rejects_unknown_labels() {
        assert!(str_to_decision("maybe").is_err());
    }
}
