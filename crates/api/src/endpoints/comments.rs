//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use lyceum_common::{AppError, AppResult};
use lyceum_core::{CommentNode, CreateCommentInput, EngagementCounters, Target};
use lyceum_db::entities::comment;
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::parse_vote_value, extractors::AuthUser, middleware::AppState, response::ApiResponse,
};

/// Comment as carried on the wire.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub author: String,
    pub post_id: Option<String>,
    pub essay_id: Option<String>,
    pub parent_comment: Option<String>,
    pub content: String,
    pub votes: i32,
    pub created_at: String,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            author: c.author_id,
            post_id: c.post_id,
            essay_id: c.essay_id,
            parent_comment: c.parent_id,
            content: c.body,
            votes: c.votes,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Comment node with its replies, as carried on the wire.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNodeResponse {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub replies: Vec<CommentNodeResponse>,
}

impl From<CommentNode> for CommentNodeResponse {
    fn from(node: CommentNode) -> Self {
        Self {
            comment: node.comment.into(),
            replies: node.replies.into_iter().map(Into::into).collect(),
        }
    }
}

/// Listing query: exactly one of postId / essayId.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListQuery {
    pub post_id: Option<String>,
    pub essay_id: Option<String>,
}

/// List a content item's comments as a reply forest.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<CommentListQuery>,
) -> AppResult<ApiResponse<Vec<CommentNodeResponse>>> {
    let forest = match (query.post_id, query.essay_id) {
        (Some(post_id), None) => state.comment_service.list_for_post(&post_id).await?,
        (None, Some(essay_id)) => state.comment_service.list_for_essay(&essay_id).await?,
        _ => {
            return Err(AppError::BadRequest(
                "postId or essayId is required".to_string(),
            ));
        }
    };

    Ok(ApiResponse::ok(
        forest.into_iter().map(Into::into).collect(),
    ))
}

/// Create a comment or a reply.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(&user.id, req).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote_type: i32,
}

/// Vote on a comment (+1 / -1).
async fn vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<EngagementCounters>> {
    let kind = parse_vote_value(req.vote_type)?;
    let counters = state
        .engagement_service
        .react(&user.id, &Target::Comment(id), kind)
        .await?;

    Ok(ApiResponse::ok(counters))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}/vote", post(vote))
}
