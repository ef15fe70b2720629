//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use lyceum_common::AppResult;
use lyceum_core::{GoogleSignInInput, RegisterInput};
use lyceum_db::entities::user;
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Authenticated user summary returned by the auth endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl From<&user::Model> for AuthUserResponse {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar_url.clone(),
        }
    }
}

/// Token plus user summary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user: AuthUserResponse,
}

impl SessionResponse {
    fn from_user(user: &user::Model) -> Self {
        Self {
            token: user.token.clone().unwrap_or_default(),
            user: AuthUserResponse::from(user),
        }
    }
}

/// Create a new account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state.user_service.register(req).await?;
    Ok(ApiResponse::ok(SessionResponse::from_user(&user)))
}

/// Login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Sign in with email and password.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state.user_service.login(&req.email, &req.password).await?;
    Ok(ApiResponse::ok(SessionResponse::from_user(&user)))
}

/// Sign in with a Google identity assertion.
async fn google(
    State(state): State<AppState>,
    Json(req): Json<GoogleSignInInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state.user_service.google_sign_in(req).await?;
    Ok(ApiResponse::ok(SessionResponse::from_user(&user)))
}

/// Forgot-password request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Acknowledgement response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OkResponse {
    pub ok: bool,
}

/// Start a password reset. Answers identically whether or not the
/// address belongs to an account.
async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<ApiResponse<OkResponse>> {
    state.user_service.request_password_reset(&req.email).await?;
    Ok(ApiResponse::ok(OkResponse { ok: true }))
}

/// Reset-password request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Complete a password reset with the emailed token.
async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<ApiResponse<OkResponse>> {
    state
        .user_service
        .reset_password(&req.token, &req.password)
        .await?;
    Ok(ApiResponse::ok(OkResponse { ok: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/google", post(google))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}
