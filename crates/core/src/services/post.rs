//! Post service.

use lyceum_common::{AppResult, IdGenerator};
use lyceum_db::{
    entities::post::{self, Category, PostKind},
    repositories::PostRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Default page size for listings.
const DEFAULT_PAGE_SIZE: u64 = 20;
/// Hard cap on requested page sizes.
const MAX_PAGE_SIZE: u64 = 100;

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

/// Input for creating a new post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 300))]
    pub title: String,

    #[validate(length(min = 1, max = 50000))]
    pub content: String,

    #[serde(default = "default_post_kind", rename = "type")]
    pub kind: PostKind,

    #[serde(default = "default_category")]
    pub category: Category,
}

const fn default_post_kind() -> PostKind {
    PostKind::Discussion
}

const fn default_category() -> Category {
    Category::Other
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Category filter; absent or "All" means no filter.
    pub category: Option<String>,
}

/// One page of posts plus pagination totals.
#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<post::Model>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(post_repo: PostRepository) -> Self {
        Self {
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new post.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            title: Set(input.title),
            body: Set(input.content),
            kind: Set(input.kind),
            category: Set(input.category),
            ..Default::default()
        };

        self.post_repo.create(model).await
    }

    /// Fetch a post's detail, bumping its view counter.
    pub async fn get(&self, id: &str) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;
        self.post_repo.increment_views(id).await?;

        Ok(post::Model {
            views: post.views + 1,
            ..post
        })
    }

    /// List posts newest-first with pagination and category filtering.
    pub async fn list(&self, query: PostListQuery) -> AppResult<PostPage> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let category = query
            .category
            .filter(|c| c != "All")
            .and_then(|c| parse_category(&c));

        let (posts, total) = self.post_repo.list(category, page, limit).await?;

        Ok(PostPage {
            posts,
            current_page: page,
            total_pages: total.div_ceil(limit),
            total,
        })
    }
}

/// Parse a category label the way the wire carries it; unknown labels
/// simply disable the filter rather than erroring.
fn parse_category(label: &str) -> Option<Category> {
    serde_json::from_value(serde_json::Value::String(label.to_string())).ok()
}
