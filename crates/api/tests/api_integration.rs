//! API integration tests.
//!
//! These tests verify the API endpoints work correctly together.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use lyceum_api::{middleware::AppState, router as api_router};
use lyceum_common::config::ThreadStrategy;
use lyceum_core::{CommentService, EngagementService, EssayService, PostService, UserService};
use lyceum_db::entities::{comment, user, user_profile};
use lyceum_db::repositories::{
    CommentRepository, EssayRepository, PostRepository, ReactionRepository, UserRepository,
    UserProfileRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::sync::Arc;
use tower::ServiceExt;

/// Build an application over a mock database connection.
fn build_app(db: Arc<DatabaseConnection>) -> Router {
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let essay_repo = EssayRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let reaction_repo = ReactionRepository::new(Arc::clone(&db));

    let state = AppState {
        user_service: UserService::new(
            user_repo.clone(),
            profile_repo,
            post_repo.clone(),
            essay_repo.clone(),
            comment_repo.clone(),
            reaction_repo,
        ),
        post_service: PostService::new(post_repo.clone()),
        essay_service: EssayService::new(essay_repo.clone()),
        comment_service: CommentService::new(
            comment_repo,
            post_repo.clone(),
            essay_repo.clone(),
            user_repo,
            ThreadStrategy::SinglePass,
        ),
        engagement_service: EngagementService::new(
            Arc::clone(&db),
            post_repo,
            essay_repo,
            CommentRepository::new(db),
        ),
    };

    api_router().with_state(state)
}

fn test_user(id: &str, username: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: username.to_string(),
        username_lower: username.to_lowercase(),
        email: format!("{username}@example.com"),
        token: Some("test_token".to_string()),
        bio: None,
        avatar_url: None,
        location: None,
        interests: serde_json::json!([]),
        awards: serde_json::json!([]),
        posts_count: 0,
        essays_count: 0,
        comments_count: 0,
        total_views: 0,
        total_insightful: 0,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn test_comment(id: &str, post_id: &str, parent_id: Option<&str>) -> comment::Model {
    comment::Model {
        id: id.to_string(),
        author_id: "u1".to_string(),
        post_id: Some(post_id.to_string()),
        essay_id: None,
        parent_id: parent_id.map(ToString::to_string),
        body: "On the immortality of the soul".to_string(),
        votes: 0,
        created_at: Utc::now().into(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_list_comments_requires_target() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let app = build_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/comments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_list_comments_returns_forest() {
    let root = test_comment("c1", "p1", None);
    let reply = test_comment("c2", "p1", Some("c1"));

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[root, reply]])
            .into_connection(),
    );
    let app = build_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/comments?postId=p1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let forest = json["data"].as_array().unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0]["id"], "c1");
    assert_eq!(forest[0]["replies"][0]["id"], "c2");
    assert!(forest[0]["replies"][0]["replies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_post_requires_auth() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let app = build_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/posts")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({"title": "t", "content": "c"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_post_detail_not_found() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<lyceum_db::entities::post::Model>::new()])
            .into_connection(),
    );
    let app = build_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/posts/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "POST_NOT_FOUND");
}

#[tokio::test]
async fn test_register_issues_token() {
    let created = test_user("u1", "diotima");
    let profile = user_profile::Model {
        user_id: "u1".to_string(),
        password: Some("hash".to_string()),
        google_id: None,
        reset_token: None,
        reset_token_expires_at: None,
        created_at: Utc::now().into(),
        updated_at: None,
    };

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            // username free, email free
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([Vec::<user::Model>::new()])
            // user INSERT .. RETURNING, profile INSERT .. RETURNING
            .append_query_results([[created]])
            .append_query_results([[profile]])
            .into_connection(),
    );
    let app = build_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": "diotima",
                        "email": "diotima@example.com",
                        "password": "mantinea"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["token"], "test_token");
    assert_eq!(json["data"]["user"]["username"], "diotima");
    // Tokens never leak through the nested user summary.
    assert!(json["data"]["user"]["token"].is_null());
}

#[tokio::test]
async fn test_vote_requires_auth() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let app = build_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/comments/c1/vote")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::json!({"voteType": 1}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
