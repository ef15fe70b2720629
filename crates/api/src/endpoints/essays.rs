//! Essay endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use lyceum_common::AppResult;
use lyceum_core::{CreateEssayInput, EngagementCounters, EssayListQuery, Target};
use lyceum_db::entities::essay;
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::parse_reaction_label, extractors::AuthUser, middleware::AppState,
    response::ApiResponse,
};

/// Essay as carried on the wire.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayResponse {
    pub id: String,
    pub author: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: essay::EssayKind,
    pub category: essay::Category,
    pub published: bool,
    pub insightful: i32,
    pub not_helpful: i32,
    pub views: i32,
    pub comment_count: i32,
    pub created_at: String,
}

impl From<essay::Model> for EssayResponse {
    fn from(e: essay::Model) -> Self {
        Self {
            id: e.id,
            author: e.author_id,
            title: e.title,
            content: e.body,
            kind: e.kind,
            category: e.category,
            published: e.published,
            insightful: e.insightful,
            not_helpful: e.not_helpful,
            views: e.views,
            comment_count: e.comment_count,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

/// One page of essays.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayListResponse {
    pub essays: Vec<EssayResponse>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
}

/// List published essays.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<EssayListQuery>,
) -> AppResult<ApiResponse<EssayListResponse>> {
    let page = state.essay_service.list(query).await?;

    Ok(ApiResponse::ok(EssayListResponse {
        essays: page.essays.into_iter().map(Into::into).collect(),
        current_page: page.current_page,
        total_pages: page.total_pages,
        total: page.total,
    }))
}

/// Get an essay's detail (bumps its view counter).
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<EssayResponse>> {
    let essay = state.essay_service.get(&id).await?;
    Ok(ApiResponse::ok(essay.into()))
}

/// Create an essay.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateEssayInput>,
) -> AppResult<ApiResponse<EssayResponse>> {
    let essay = state.essay_service.create(&user.id, req).await?;
    Ok(ApiResponse::ok(essay.into()))
}

/// Reaction request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub reaction_type: String,
}

/// React to an essay (insightful / notHelpful).
async fn react(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReactionRequest>,
) -> AppResult<ApiResponse<EngagementCounters>> {
    let kind = parse_reaction_label(&req.reaction_type)?;
    let counters = state
        .engagement_service
        .react(&user.id, &Target::Essay(id), kind)
        .await?;

    Ok(ApiResponse::ok(counters))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail))
        .route("/{id}/reaction", post(react))
}
