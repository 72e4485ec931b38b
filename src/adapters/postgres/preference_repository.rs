//! PostgreSQL implementation of PreferenceRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::UserPreference;
use crate::ports::{NewPreferences, PreferenceChanges, PreferenceRepository, RepositoryError};

const PREF_COLUMNS: &str = "id, user_id, language, tts_voice, auto_reply_enabled, \
                            conversation_timeout_secs, notification_email, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresPreferenceRepository {
    pool: PgPool,
}

impl PostgresPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceRepository for PostgresPreferenceRepository {
    async fn create(
        &self,
        user_id: i64,
        prefs: NewPreferences,
    ) -> Result<UserPreference, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO user_preferences \
                (user_id, language, tts_voice, auto_reply_enabled, \
                 conversation_timeout_secs, notification_email) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PREF_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&prefs.language)
        .bind(&prefs.tts_voice)
        .bind(prefs.auto_reply_enabled)
        .bind(prefs.conversation_timeout_secs)
        .bind(&prefs.notification_email)
        .fetch_one(&self.pool)
        .await?;

        row_to_preference(&row)
    }

    async fn get(&self, id: i64) -> Result<Option<UserPreference>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PREF_COLUMNS} FROM user_preferences WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_preference).transpose()
    }

    async fn get_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<UserPreference>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PREF_COLUMNS} FROM user_preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_preference).transpose()
    }

    async fn update(
        &self,
        id: i64,
        changes: PreferenceChanges,
    ) -> Result<Option<UserPreference>, RepositoryError> {
        let row = sqlx::query(&format!(
            "UPDATE user_preferences SET \
                language = COALESCE($2, language), \
                tts_voice = COALESCE($3, tts_voice), \
                auto_reply_enabled = COALESCE($4, auto_reply_enabled), \
                conversation_timeout_secs = COALESCE($5, conversation_timeout_secs), \
                notification_email = COALESCE($6, notification_email), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {PREF_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.language)
        .bind(&changes.tts_voice)
        .bind(changes.auto_reply_enabled)
        .bind(changes.conversation_timeout_secs)
        .bind(&changes.notification_email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_preference).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_preferences WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_preference(row: &PgRow) -> Result<UserPreference, RepositoryError> {
    Ok(UserPreference {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        language: row.try_get("language")?,
        tts_voice: row.try_get("tts_voice")?,
        auto_reply_enabled: row.try_get("auto_reply_enabled")?,
        conversation_timeout_secs: row.try_get("conversation_timeout_secs")?,
        notification_email: row.try_get("notification_email")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
