//! Comment service.

use crate::services::email::EmailService;
use crate::services::thread::{CommentNode, build_forest};
use lyceum_common::config::ThreadStrategy;
use lyceum_common::{AppError, AppResult, IdGenerator};
use lyceum_db::{
    entities::comment,
    repositories::{CommentRepository, EssayRepository, PostRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    essay_repo: EssayRepository,
    user_repo: UserRepository,
    email: Option<EmailService>,
    strategy: ThreadStrategy,
    server_url: String,
    id_gen: IdGenerator,
}

/// Input for creating a new comment or reply.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,

    pub post_id: Option<String>,
    pub essay_id: Option<String>,

    /// Parent comment ID when replying; null creates a root comment.
    pub parent_comment: Option<String>,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        essay_repo: EssayRepository,
        user_repo: UserRepository,
        strategy: ThreadStrategy,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            essay_repo,
            user_repo,
            email: None,
            strategy,
            server_url: String::new(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the email service used for comment notifications.
    pub fn set_email(&mut self, email: EmailService, server_url: String) {
        self.email = Some(email);
        self.server_url = server_url;
    }

    /// Create a comment or a reply.
    ///
    /// The parent content item's comment count is incremented in the same
    /// request; replies count toward that flat total, there is no
    /// per-comment reply counter.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        if input.content.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Content and postId or essayId are required".to_string(),
            ));
        }

        // Exactly one parent content reference.
        let (content_title, content_author_id, content_url) =
            match (&input.post_id, &input.essay_id) {
                (Some(post_id), None) => {
                    let post = self.post_repo.get_by_id(post_id).await?;
                    let url = format!("{}/posts/{}", self.server_url, post.id);
                    (post.title, post.author_id, url)
                }
                (None, Some(essay_id)) => {
                    let essay = self.essay_repo.get_by_id(essay_id).await?;
                    let url = format!("{}/essays/{}", self.server_url, essay.id);
                    (essay.title, essay.author_id, url)
                }
                _ => {
                    return Err(AppError::BadRequest(
                        "Content and postId or essayId are required".to_string(),
                    ));
                }
            };

        // A reply's parent must sit on the same content item.
        let parent = if let Some(ref parent_id) = input.parent_comment {
            let parent = self.comment_repo.get_by_id(parent_id).await?;
            if parent.post_id != input.post_id || parent.essay_id != input.essay_id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to a different discussion".to_string(),
                ));
            }
            Some(parent)
        } else {
            None
        };

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            post_id: Set(input.post_id.clone()),
            essay_id: Set(input.essay_id.clone()),
            parent_id: Set(input.parent_comment.clone()),
            body: Set(input.content),
            ..Default::default()
        };

        let comment = self.comment_repo.create(model).await?;

        if let Some(ref post_id) = input.post_id {
            self.post_repo.increment_comment_count(post_id).await?;
        }
        if let Some(ref essay_id) = input.essay_id {
            self.essay_repo.increment_comment_count(essay_id).await?;
        }

        // Best-effort notifications; failures never fail the comment itself.
        if let Err(e) = self
            .notify(
                author_id,
                &comment,
                &content_title,
                &content_author_id,
                &content_url,
                parent.as_ref(),
            )
            .await
        {
            tracing::warn!(error = %e, comment_id = %comment.id, "Failed to send comment notification");
        }

        Ok(comment)
    }

    async fn notify(
        &self,
        actor_id: &str,
        comment: &comment::Model,
        content_title: &str,
        content_author_id: &str,
        content_url: &str,
        parent: Option<&comment::Model>,
    ) -> AppResult<()> {
        let Some(email) = self.email.as_ref() else {
            return Ok(());
        };

        let actor = self.user_repo.get_by_id(actor_id).await?;

        // Never notify the commenter themself.
        if content_author_id != actor_id {
            let recipient = self.user_repo.get_by_id(content_author_id).await?;
            email
                .notify_comment(
                    &recipient.email,
                    &actor.username,
                    content_title,
                    &comment.body,
                    false,
                    content_url,
                )
                .await?;
        }

        if let Some(parent) = parent {
            // Skip when the reply targets the commenter's own comment, and
            // avoid double-notifying the content author.
            if parent.author_id != actor_id && parent.author_id != content_author_id {
                let recipient = self.user_repo.get_by_id(&parent.author_id).await?;
                email
                    .notify_comment(
                        &recipient.email,
                        &actor.username,
                        content_title,
                        &comment.body,
                        true,
                        content_url,
                    )
                    .await?;
            }
        }

        Ok(())
    }

    /// List a post's comments as a reply forest.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<CommentNode>> {
        match self.strategy {
            ThreadStrategy::SinglePass => {
                let flat = self.comment_repo.find_for_post(post_id).await?;
                Ok(build_forest(flat))
            }
            ThreadStrategy::TwoPass => {
                let roots = self.comment_repo.find_roots_for_post(post_id).await?;
                self.attach_direct_replies(roots).await
            }
        }
    }

    /// List an essay's comments as a reply forest.
    pub async fn list_for_essay(&self, essay_id: &str) -> AppResult<Vec<CommentNode>> {
        match self.strategy {
            ThreadStrategy::SinglePass => {
                let flat = self.comment_repo.find_for_essay(essay_id).await?;
                Ok(build_forest(flat))
            }
            ThreadStrategy::TwoPass => {
                let roots = self.comment_repo.find_roots_for_essay(essay_id).await?;
                self.attach_direct_replies(roots).await
            }
        }
    }

    /// Two-pass assembly: one reply fetch per root, nesting capped at depth 1.
    async fn attach_direct_replies(
        &self,
        roots: Vec<comment::Model>,
    ) -> AppResult<Vec<CommentNode>> {
        let mut forest = Vec::with_capacity(roots.len());
        for root in roots {
            let replies = self
                .comment_repo
                .find_replies(&root.id)
                .await?
                .into_iter()
                .map(CommentNode::leaf)
                .collect();
            forest.push(CommentNode {
                comment: root,
                replies,
            });
        }
        Ok(forest)
    }
}
