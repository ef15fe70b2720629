//! User and profile endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use lyceum_common::AppResult;
use lyceum_core::{AwardInput, UpdateProfileInput};
use lyceum_db::entities::user;
use serde::Serialize;

use crate::{
    endpoints::comments::CommentResponse, endpoints::essays::EssayResponse,
    endpoints::posts::PostResponse, extractors::AuthUser, middleware::AppState,
    response::ApiResponse,
};

/// Public user as carried on the wire: no email, no token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub interests: serde_json::Value,
    pub awards: serde_json::Value,
    pub posts_count: i32,
    pub essays_count: i32,
    pub comments_count: i32,
    pub total_views: i32,
    pub total_insightful: i32,
    pub joined_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            bio: u.bio,
            avatar_url: u.avatar_url,
            location: u.location,
            interests: u.interests,
            awards: u.awards,
            posts_count: u.posts_count,
            essays_count: u.essays_count,
            comments_count: u.comments_count,
            total_views: u.total_views,
            total_insightful: u.total_insightful,
            joined_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Public profile with recent activity.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub posts: Vec<PostResponse>,
    pub essays: Vec<EssayResponse>,
    pub comments: Vec<CommentResponse>,
}

/// Get a user's public profile.
async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state.user_service.profile(&username).await?;

    Ok(ApiResponse::ok(ProfileResponse {
        user: profile.user.into(),
        posts: profile.posts.into_iter().map(Into::into).collect(),
        essays: profile.essays.into_iter().map(Into::into).collect(),
        comments: profile.comments.into_iter().map(Into::into).collect(),
    }))
}

/// Recomputed statistics response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_views: i32,
    pub total_insightful: i32,
    pub posts_count: i32,
    pub essays_count: i32,
    pub comments_count: i32,
    pub awards: serde_json::Value,
}

/// Recompute and return a user's activity statistics.
async fn stats(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<StatsResponse>> {
    let stats = state.user_service.stats(&username).await?;

    Ok(ApiResponse::ok(StatsResponse {
        total_views: stats.total_views,
        total_insightful: stats.total_insightful,
        posts_count: stats.posts_count,
        essays_count: stats.essays_count,
        comments_count: stats.comments_count,
        awards: stats.awards,
    }))
}

/// Award a badge to a user.
async fn award(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<AwardInput>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let awards = state.user_service.award(&username, req).await?;
    Ok(ApiResponse::ok(awards))
}

/// Own account, including the email address.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub email: String,
}

/// Get the authenticated user's own profile.
async fn me(AuthUser(user): AuthUser) -> AppResult<ApiResponse<MeResponse>> {
    let email = user.email.clone();
    Ok(ApiResponse::ok(MeResponse {
        user: user.into(),
        email,
    }))
}

/// Update the authenticated user's profile.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.update_profile(&user.id, req).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Deletion acknowledgement.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountResponse {
    pub message: String,
}

/// Delete the authenticated user's account and all owned content.
async fn delete_account(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DeleteAccountResponse>> {
    state.user_service.delete_account(&user.id).await?;

    Ok(ApiResponse::ok(DeleteAccountResponse {
        message: "Account deleted successfully".to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/account", delete(delete_account))
        .route("/{username}", get(profile))
        .route("/{username}/stats", get(stats))
        .route("/{username}/award", post(award))
}
