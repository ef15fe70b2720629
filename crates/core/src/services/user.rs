//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use lyceum_common::{AppError, AppResult, IdGenerator};
use lyceum_db::{
    entities::{comment, essay, post, user, user_profile},
    repositories::{
        CommentRepository, EssayRepository, PostRepository, ReactionRepository, UserRepository,
        UserProfileRepository,
    },
};
use sea_orm::Set;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::services::email::EmailService;

/// How long an emailed password-reset token stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    post_repo: PostRepository,
    essay_repo: EssayRepository,
    comment_repo: CommentRepository,
    reaction_repo: ReactionRepository,
    email: Option<EmailService>,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

/// Input for signing in with a Google identity assertion.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignInInput {
    #[validate(length(min = 1, max = 64))]
    pub google_id: String,

    #[validate(email)]
    pub email: String,

    pub picture: Option<String>,
}

/// Input for updating a user's profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(length(max = 256))]
    pub location: Option<String>,

    pub interests: Option<Vec<String>>,

    #[validate(length(max = 512))]
    pub profile_picture: Option<String>,
}

/// Input for awarding a badge.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AwardInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    pub description: Option<String>,
    pub icon: Option<String>,
}

/// A user's public profile with their recent activity.
#[derive(Debug)]
pub struct PublicProfile {
    pub user: user::Model,
    pub posts: Vec<post::Model>,
    pub essays: Vec<essay::Model>,
    pub comments: Vec<comment::Model>,
}

/// Recomputed activity statistics.
#[derive(Debug)]
pub struct UserStats {
    pub total_views: i32,
    pub total_insightful: i32,
    pub posts_count: i32,
    pub essays_count: i32,
    pub comments_count: i32,
    pub awards: serde_json::Value,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        post_repo: PostRepository,
        essay_repo: EssayRepository,
        comment_repo: CommentRepository,
        reaction_repo: ReactionRepository,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            post_repo,
            essay_repo,
            comment_repo,
            reaction_repo,
            email: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the email service used for password-reset mail.
    pub fn set_email(&mut self, email: EmailService) {
        self.email = Some(email);
    }

    /// Register a new account and issue its bearer token.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
            || self.user_repo.find_by_email(&input.email).await?.is_some()
        {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email.to_lowercase()),
            token: Set(Some(token)),
            interests: Set(serde_json::json!([])),
            awards: Set(serde_json::json!([])),
            ..Default::default()
        };

        let user = self.user_repo.create(user_model).await?;

        let profile_model = user_profile::ActiveModel {
            user_id: Set(user_id),
            password: Set(Some(password_hash)),
            ..Default::default()
        };

        self.profile_repo.create(profile_model).await?;

        Ok(user)
    }

    /// Authenticate by email and password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let profile = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let Some(password_hash) = profile.password else {
            return Err(AppError::BadRequest(
                "Please sign in with Google".to_string(),
            ));
        };

        if !verify_password(password, &password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Sign in with a verified Google identity assertion, linking or
    /// creating the account as needed.
    pub async fn google_sign_in(&self, input: GoogleSignInInput) -> AppResult<user::Model> {
        input.validate()?;

        // Already linked?
        if let Some(profile) = self.profile_repo.find_by_google_id(&input.google_id).await? {
            return self.user_repo.get_by_id(&profile.user_id).await;
        }

        // Existing account with this email: link the identity.
        if let Some(user) = self.user_repo.find_by_email(&input.email).await? {
            if let Some(profile) = self.profile_repo.find_by_user_id(&user.id).await? {
                let mut active: user_profile::ActiveModel = profile.into();
                active.google_id = Set(Some(input.google_id));
                active.updated_at = Set(Some(Utc::now().into()));
                self.profile_repo.update(active).await?;
            }
            return Ok(user);
        }

        // Fresh account with a derived username and no password.
        let local_part = input.email.split('@').next().unwrap_or("philosopher");
        let suffix = self.id_gen.generate_token();
        let username = format!("{local_part}{}", &suffix[..6]);

        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(username.clone()),
            username_lower: Set(username.to_lowercase()),
            email: Set(input.email.to_lowercase()),
            token: Set(Some(token)),
            avatar_url: Set(input.picture),
            interests: Set(serde_json::json!([])),
            awards: Set(serde_json::json!([])),
            ..Default::default()
        };

        let user = self.user_repo.create(user_model).await?;

        let profile_model = user_profile::ActiveModel {
            user_id: Set(user_id),
            google_id: Set(Some(input.google_id)),
            ..Default::default()
        };
        self.profile_repo.create(profile_model).await?;

        Ok(user)
    }

    /// Authenticate a user by bearer token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user's public profile with their recent activity.
    pub async fn profile(&self, username: &str) -> AppResult<PublicProfile> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        let posts = self.post_repo.find_recent_by_author(&user.id, 10).await?;
        let essays = self
            .essay_repo
            .find_recent_published_by_author(&user.id, 10)
            .await?;
        let comments = self
            .comment_repo
            .find_recent_by_author(&user.id, 10)
            .await?;

        Ok(PublicProfile {
            user,
            posts,
            essays,
            comments,
        })
    }

    /// Update the authenticated user's profile fields.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(interests) = input.interests {
            active.interests = Set(serde_json::json!(interests));
        }
        if let Some(picture) = input.profile_picture {
            active.avatar_url = Set(Some(picture));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Recompute a user's activity statistics from their content, persist
    /// the refreshed counters, and return them.
    pub async fn stats(&self, username: &str) -> AppResult<UserStats> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        let posts_count = clamp_count(self.post_repo.count_by_author(&user.id).await?);
        let essays_count = clamp_count(
            self.essay_repo
                .count_published_by_author(&user.id)
                .await?,
        );
        let comments_count = clamp_count(self.comment_repo.count_by_author(&user.id).await?);

        let total_views = clamp_sum(
            self.post_repo.sum_views_by_author(&user.id).await?
                + self.essay_repo.sum_views_by_author(&user.id).await?,
        );
        let total_insightful = clamp_sum(
            self.post_repo.sum_insightful_by_author(&user.id).await?
                + self.essay_repo.sum_insightful_by_author(&user.id).await?,
        );

        self.user_repo
            .update_stats(
                &user.id,
                posts_count,
                essays_count,
                comments_count,
                total_views,
                total_insightful,
            )
            .await?;

        Ok(UserStats {
            total_views,
            total_insightful,
            posts_count,
            essays_count,
            comments_count,
            awards: user.awards,
        })
    }

    /// Append a badge to a user's award list.
    pub async fn award(&self, username: &str, input: AwardInput) -> AppResult<serde_json::Value> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        let mut awards = match user.awards.clone() {
            serde_json::Value::Array(list) => list,
            _ => Vec::new(),
        };
        awards.push(serde_json::json!({
            "name": input.name,
            "description": input.description,
            "icon": input.icon,
            "earnedAt": Utc::now().to_rfc3339(),
        }));
        let awards = serde_json::Value::Array(awards);

        let mut active: user::ActiveModel = user.into();
        active.awards = Set(awards.clone());
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        Ok(awards)
    }

    /// Start a password reset: store the hashed token with its expiry and
    /// email the raw token. Answers identically whether or not the address
    /// belongs to an account.
    pub async fn request_password_reset(&self, email_address: &str) -> AppResult<()> {
        let Some(user) = self.user_repo.find_by_email(email_address).await? else {
            return Ok(());
        };
        let Some(profile) = self.profile_repo.find_by_user_id(&user.id).await? else {
            return Ok(());
        };

        let token = self.id_gen.generate_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

        let mut active: user_profile::ActiveModel = profile.into();
        active.reset_token = Set(Some(hash_reset_token(&token)));
        active.reset_token_expires_at = Set(Some(expires_at.into()));
        active.updated_at = Set(Some(Utc::now().into()));
        self.profile_repo.update(active).await?;

        if let Some(ref email) = self.email {
            if let Err(e) = email.notify_password_reset(&user.email, &token).await {
                tracing::warn!(error = %e, user_id = %user.id, "Failed to send password reset email");
            }
        }

        Ok(())
    }

    /// Complete a password reset with the emailed token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        if new_password.len() < 6 {
            return Err(AppError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let profile = self
            .profile_repo
            .find_by_reset_token(&hash_reset_token(token))
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let still_valid = profile
            .reset_token_expires_at
            .is_some_and(|expires| expires > Utc::now());
        if !still_valid {
            return Err(AppError::BadRequest(
                "Invalid or expired reset token".to_string(),
            ));
        }

        let mut active: user_profile::ActiveModel = profile.into();
        active.password = Set(Some(hash_password(new_password)?));
        active.reset_token = Set(None);
        active.reset_token_expires_at = Set(None);
        active.updated_at = Set(Some(Utc::now().into()));
        self.profile_repo.update(active).await?;

        Ok(())
    }

    /// Delete an account and everything it owns: reactions, comments,
    /// posts, essays, then the user row itself (the profile goes with it).
    pub async fn delete_account(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let reactions = self.reaction_repo.delete_by_user(user_id).await?;
        let comments = self.comment_repo.delete_by_author(user_id).await?;
        let posts = self.post_repo.delete_by_author(user_id).await?;
        let essays = self.essay_repo.delete_by_author(user_id).await?;
        self.user_repo.delete(user_id).await?;

        tracing::info!(
            user_id = %user.id,
            reactions,
            comments,
            posts,
            essays,
            "Deleted account and owned content"
        );

        Ok(())
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// SHA-256 hex digest of a reset token; only the digest is stored.
fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn clamp_count(count: u64) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn clamp_sum(sum: i64) -> i32 {
    i32::try_from(sum).unwrap_or(i32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
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

    fn service_over(db: Arc<DatabaseConnection>) -> UserService {
        UserService::new(
            UserRepository::new(Arc::clone(&db)),
            UserProfileRepository::new(Arc::clone(&db)),
            PostRepository::new(Arc::clone(&db)),
            EssayRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            ReactionRepository::new(db),
        )
    }

    // === Password hashing ===

    #[test]
    fn test_hash_password() {
        let hash = hash_password("examined_life").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_verify_password_roundtrip() {
        let hash = hash_password("examined_life").unwrap();
        assert!(verify_password("examined_life", &hash).unwrap());
        assert!(!verify_password("unexamined_life", &hash).unwrap());
    }

    #[test]
    fn test_hash_password_salted() {
        let h1 = hash_password("same").unwrap();
        let h2 = hash_password("same").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_hash_reset_token_stable_hex() {
        let a = hash_reset_token("token-a");
        let b = hash_reset_token("token-a");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, hash_reset_token("token-b"));
    }

    // === Service paths ===

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let existing = create_test_user("u1", "hypatia");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = service_over(db);

        let input = RegisterInput {
            username: "hypatia".to_string(),
            email: "hypatia@example.com".to_string(),
            password: "alexandria".to_string(),
        };

        let result = service.register(input).await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("already exists")),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[tokio::test]
    async fn test_register_input_validation() {
        let input = RegisterInput {
            username: "ab".to_string(),
            email: "ab@example.com".to_string(),
            password: "longenough".to_string(),
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "abc".to_string(),
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "abc".to_string(),
            email: "abc@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = service_over(db);

        let result = service.login("nobody@example.com", "whatever").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_external_identity_account() {
        let user = create_test_user("u1", "hypatia");
        let profile = user_profile::Model {
            user_id: "u1".to_string(),
            password: None,
            google_id: Some("google-1".to_string()),
            reset_token: None,
            reset_token_expires_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[profile]])
                .into_connection(),
        );
        let service = service_over(db);

        let result = service.login("hypatia@example.com", "whatever").await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Google")),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_by_token_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = service_over(db);

        let result = service.authenticate_by_token("invalid").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_short_password() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service_over(db);

        let result = service.reset_password("token", "short").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reset_password_expired_token() {
        let profile = user_profile::Model {
            user_id: "u1".to_string(),
            password: Some("old-hash".to_string()),
            google_id: None,
            reset_token: Some(hash_reset_token("token")),
            reset_token_expires_at: Some((Utc::now() - Duration::hours(2)).into()),
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .into_connection(),
        );
        let service = service_over(db);

        let result = service.reset_password("token", "new-password").await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("expired")),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[tokio::test]
    async fn test_delete_account_sweeps_owned_rows() {
        let user = create_test_user("u1", "hypatia");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                // reactions, comments, posts, essays, user
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 3,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 5,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let service = service_over(db);

        assert!(service.delete_account("u1").await.is_ok());
    }
}
