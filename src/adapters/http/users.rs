//! User CRUD endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{bad_request, internal_error, not_found, AppState};
use crate::domain::User;
use crate::ports::{NewUser, UserChanges};

// ════════════════════════════════════════════════════════════════════════════
// DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 {
    10
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone_number: user.phone_number,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /users - create a user after uniqueness checks.
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Response {
    if req.username.is_empty() || req.username.chars().count() > 100 {
        return bad_request("username must be 1 to 100 characters");
    }
    if req.email.is_empty() {
        return bad_request("email must not be empty");
    }

    match state.users.get_by_username(&req.username).await {
        Ok(Some(_)) => return bad_request("Username already exists"),
        Ok(None) => {}
        Err(err) => {
            error!(error = %err, "failed to check username uniqueness");
            return internal_error("Error creating user");
        }
    }

    match state.users.get_by_email(&req.email).await {
        Ok(Some(_)) => return bad_request("Email already exists"),
        Ok(None) => {}
        Err(err) => {
            error!(error = %err, "failed to check email uniqueness");
            return internal_error("Error creating user");
        }
    }

    let new_user = NewUser {
        username: req.username,
        email: req.email,
        phone_number: req.phone_number,
    };

    match state.users.create(new_user).await {
        Ok(user) => {
            info!(username = %user.username, "user created");
            (StatusCode::CREATED, Json(UserResponse::from(user))).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to create user");
            internal_error("Error creating user")
        }
    }
}

/// GET /users/:id
async fn get_user(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    match state.users.get(user_id).await {
        Ok(Some(user)) => Json(UserResponse::from(user)).into_response(),
        Ok(None) => not_found("User not found"),
        Err(err) => {
            error!(error = %err, user_id, "failed to fetch user");
            internal_error("Error getting user")
        }
    }
}

/// GET /users?skip&limit
async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersParams>,
) -> Response {
    match state.users.list(params.skip, params.limit).await {
        Ok(users) => {
            let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
            Json(body).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to list users");
            internal_error("Error listing users")
        }
    }
}

/// PUT /users/:id
async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Response {
    let changes = UserChanges {
        email: req.email,
        phone_number: req.phone_number,
        is_active: req.is_active,
    };

    match state.users.update(user_id, changes).await {
        Ok(Some(user)) => {
            info!(user_id, "user updated");
            Json(UserResponse::from(user)).into_response()
        }
        Ok(None) => not_found("User not found"),
        Err(err) => {
            error!(error = %err, user_id, "failed to update user");
            internal_error("Error updating user")
        }
    }
}

/// DELETE /users/:id
async fn delete_user(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    match state.users.delete(user_id).await {
        Ok(true) => {
            info!(user_id, "user deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => not_found("User not found"),
        Err(err) => {
            error!(error = %err, user_id, "failed to delete user");
            internal_error("Error deleting user")
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
}
