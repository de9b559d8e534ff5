//! API authentication endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::error::AppError;
use crate::middleware::ApiAuth;
use crate::services::{auth, invites, provisioning};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Any of the three invitation code forms.
    pub invite_code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// View of a user returned by the API.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub is_active: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i32(),
            username: user.username.as_str().to_owned(),
            role: user.role.as_str().to_owned(),
            is_active: user.is_active,
        }
    }
}

/// `POST /api/v1/auth/register`
///
/// Registration is invitation-only: the code decides the role and, for
/// waiters, the manager the account reports to.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let registration = invites::resolve_invite(state.pool(), &request.invite_code).await?;
    let user = provisioning::register(
        state.pool(),
        &registration,
        &provisioning::RegistrationRequest {
            username: &request.username,
            password: &request.password,
            telegram: None,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = issue_token(&state, &request.username, &request.password).await?;
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
    }))
}

/// `GET /api/v1/users/me`
pub async fn me(ApiAuth(user): ApiAuth) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// Verify credentials and issue a JWT. Shared with the web login form.
pub(crate) async fn issue_token(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<String, AppError> {
    let credentials = crate::db::UserRepository::new(state.pool())
        .credentials_by_username(username)
        .await?;

    // Same rejection for unknown users and wrong passwords.
    let (user, stored_hash) = credentials.ok_or(AppError::Unauthorized)?;
    if !user.is_active || !auth::verify_password(password, &stored_hash) {
        return Err(AppError::Unauthorized);
    }

    auth::create_access_token(user.username.as_str(), state.secret_key())
}
