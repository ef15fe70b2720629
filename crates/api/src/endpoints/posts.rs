//! Post endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use lyceum_common::AppResult;
use lyceum_core::{CreatePostInput, EngagementCounters, PostListQuery, Target};
use lyceum_db::entities::post;
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::parse_reaction_label, extractors::AuthUser, middleware::AppState,
    response::ApiResponse,
};

/// Post as carried on the wire.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: post::PostKind,
    pub category: post::Category,
    pub insightful: i32,
    pub not_helpful: i32,
    pub views: i32,
    pub comment_count: i32,
    pub created_at: String,
}

impl From<post::Model> for PostResponse {
    fn from(p: post::Model) -> Self {
        Self {
            id: p.id,
            author: p.author_id,
            title: p.title,
            content: p.body,
            kind: p.kind,
            category: p.category,
            insightful: p.insightful,
            not_helpful: p.not_helpful,
            views: p.views,
            comment_count: p.comment_count,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// One page of posts.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
}

/// List posts.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> AppResult<ApiResponse<PostListResponse>> {
    let page = state.post_service.list(query).await?;

    Ok(ApiResponse::ok(PostListResponse {
        posts: page.posts.into_iter().map(Into::into).collect(),
        current_page: page.current_page,
        total_pages: page.total_pages,
        total: page.total,
    }))
}

/// Get a post's detail (bumps its view counter).
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get(&id).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Create a post.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.create(&user.id, req).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Reaction request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub reaction_type: String,
}

/// React to a post (insightful / notHelpful).
async fn react(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReactionRequest>,
) -> AppResult<ApiResponse<EngagementCounters>> {
    let kind = parse_reaction_label(&req.reaction_type)?;
    let counters = state
        .engagement_service
        .react(&user.id, &Target::Post(id), kind)
        .await?;

    Ok(ApiResponse::ok(counters))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail))
        .route("/{id}/reaction", post(react))
}
