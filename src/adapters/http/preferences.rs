//! Preference CRUD endpoints.
//!
//! Creation takes the owning user as a query parameter; reads are keyed by
//! user, updates and deletes by preference id.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{bad_request, internal_error, not_found, AppState};
use crate::domain::UserPreference;
use crate::ports::{NewPreferences, PreferenceChanges};

// ════════════════════════════════════════════════════════════════════════════
// DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePreferencesParams {
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePreferencesRequest {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
    #[serde(default)]
    pub auto_reply_enabled: bool,
    #[serde(default = "default_conversation_timeout")]
    pub conversation_timeout_secs: i32,
    pub notification_email: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_tts_voice() -> String {
    "nova".to_string()
}

fn default_conversation_timeout() -> i32 {
    300
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub language: Option<String>,
    pub tts_voice: Option<String>,
    pub auto_reply_enabled: Option<bool>,
    pub conversation_timeout_secs: Option<i32>,
    pub notification_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferencesResponse {
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

impl From<UserPreference> for PreferencesResponse {
    fn from(prefs: UserPreference) -> Self {
        Self {
            id: prefs.id,
            user_id: prefs.user_id,
            language: prefs.language,
            tts_voice: prefs.tts_voice,
            auto_reply_enabled: prefs.auto_reply_enabled,
            conversation_timeout_secs: prefs.conversation_timeout_secs,
            notification_email: prefs.notification_email,
            created_at: prefs.created_at,
            updated_at: prefs.updated_at,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /preferences?user_id= - one preference row per user.
async fn create_preferences(
    State(state): State<AppState>,
    Query(params): Query<CreatePreferencesParams>,
    Json(req): Json<CreatePreferencesRequest>,
) -> Response {
    match state.users.get(params.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found("User not found"),
        Err(err) => {
            error!(error = %err, "failed to check user");
            return internal_error("Error creating preferences");
        }
    }

    match state.preferences.get_by_user(params.user_id).await {
        Ok(Some(_)) => return bad_request("Preferences already exist for this user"),
        Ok(None) => {}
        Err(err) => {
            error!(error = %err, "failed to check existing preferences");
            return internal_error("Error creating preferences");
        }
    }

    let prefs = NewPreferences {
        language: req.language,
        tts_voice: req.tts_voice,
        auto_reply_enabled: req.auto_reply_enabled,
        conversation_timeout_secs: req.conversation_timeout_secs,
        notification_email: req.notification_email,
    };

    match state.preferences.create(params.user_id, prefs).await {
        Ok(created) => {
            info!(user_id = params.user_id, "preferences created");
            (StatusCode::CREATED, Json(PreferencesResponse::from(created))).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to create preferences");
            internal_error("Error creating preferences")
        }
    }
}

/// GET /preferences/:user_id - lookup by owning user.
async fn get_preferences(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    match state.preferences.get_by_user(user_id).await {
        Ok(Some(prefs)) => Json(PreferencesResponse::from(prefs)).into_response(),
        Ok(None) => not_found("Preferences not found for this user"),
        Err(err) => {
            error!(error = %err, user_id, "failed to fetch preferences");
            internal_error("Error getting preferences")
        }
    }
}

/// PUT /preferences/:id
async fn update_preferences(
    State(state): State<AppState>,
    Path(preference_id): Path<i64>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Response {
    let changes = PreferenceChanges {
        language: req.language,
        tts_voice: req.tts_voice,
        auto_reply_enabled: req.auto_reply_enabled,
        conversation_timeout_secs: req.conversation_timeout_secs,
        notification_email: req.notification_email,
    };

    match state.preferences.update(preference_id, changes).await {
        Ok(Some(prefs)) => {
            info!(preference_id, "preferences updated");
            Json(PreferencesResponse::from(prefs)).into_response()
        }
        Ok(None) => not_found("Preferences not found"),
        Err(err) => {
            error!(error = %err, preference_id, "failed to update preferences");
            internal_error("Error updating preferences")
        }
    }
}

/// DELETE /preferences/:id
async fn delete_preferences(
    State(state): State<AppState>,
    Path(preference_id): Path<i64>,
) -> Response {
    match state.preferences.delete(preference_id).await {
        Ok(true) => {
            info!(preference_id, "preferences deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => not_found("Preferences not found"),
        Err(err) => {
            error!(error = %err, preference_id, "failed to delete preferences");
            internal_error("Error deleting preferences")
        }
    }
}

pub fn routes() -> Router<AppState> {
    // GET is keyed by user id, PUT/DELETE by preference id.
    Router::new().route("/", post(create_preferences)).route(
        "/:id",
        get(get_preferences)
            .put(update_preferences)
            .delete(delete_preferences),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_fills_defaults() {
        let req: CreatePreferencesRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.language, "en");
        assert_eq!(req.tts_voice, "nova");
        assert!(!req.auto_reply_enabled);
        assert_eq!(req.conversation_timeout_secs, 300);
        assert!(req.notification_email.is_none());
    }
}
