//! Essay service.

use lyceum_common::{AppResult, IdGenerator};
use lyceum_db::{
    entities::essay::{self, Category, EssayKind},
    repositories::EssayRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Default page size for listings.
const DEFAULT_PAGE_SIZE: u64 = 20;
/// Hard cap on requested page sizes.
const MAX_PAGE_SIZE: u64 = 100;

/// Essay service for business logic.
#[derive(Clone)]
pub struct EssayService {
    essay_repo: EssayRepository,
    id_gen: IdGenerator,
}

/// Input for creating a new essay.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEssayInput {
    #[validate(length(min = 1, max = 300))]
    pub title: String,

    #[validate(length(min = 1, max = 200000))]
    pub content: String,

    #[serde(default = "default_essay_kind", rename = "type")]
    pub kind: EssayKind,

    #[serde(default = "default_category")]
    pub category: Category,

    /// Unpublished essays stay out of public listings.
    #[serde(default = "default_published")]
    pub published: bool,
}

const fn default_essay_kind() -> EssayKind {
    EssayKind::Essay
}

const fn default_category() -> Category {
    Category::Other
}

const fn default_published() -> bool {
    true
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Category filter; absent or "All" means no filter.
    pub category: Option<String>,
    /// Kind filter; absent or "All" means no filter.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// One page of essays plus pagination totals.
#[derive(Debug)]
pub struct EssayPage {
    pub essays: Vec<essay::Model>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
}

impl EssayService {
    /// Create a new essay service.
    #[must_use]
    pub const fn new(essay_repo: EssayRepository) -> Self {
        Self {
            essay_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new essay.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateEssayInput,
    ) -> AppResult<essay::Model> {
        input.validate()?;

        let model = essay::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            title: Set(input.title),
            body: Set(input.content),
            kind: Set(input.kind),
            category: Set(input.category),
            published: Set(input.published),
            ..Default::default()
        };

        self.essay_repo.create(model).await
    }

    /// Fetch an essay's detail, bumping its view counter.
    pub async fn get(&self, id: &str) -> AppResult<essay::Model> {
        let essay = self.essay_repo.get_by_id(id).await?;
        self.essay_repo.increment_views(id).await?;

        Ok(essay::Model {
            views: essay.views + 1,
            ..essay
        })
    }

    /// List published essays newest-first with pagination and filters.
    pub async fn list(&self, query: EssayListQuery) -> AppResult<EssayPage> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let category = query
            .category
            .filter(|c| c != "All")
            .and_then(|c| parse_label(&c));
        let kind = query
            .kind
            .filter(|k| k != "All")
            .and_then(|k| parse_label(&k));

        let (essays, total) = self
            .essay_repo
            .list_published(category, kind, page, limit)
            .await?;

        Ok(EssayPage {
            essays,
            current_page: page,
            total_pages: total.div_ceil(limit),
            total,
        })
    }
}

/// Parse a wire label into an enum value; unknown labels disable the filter.
fn parse_label<T: serde::de::DeserializeOwned>(label: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(label.to_string())).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_essay(id: &str, views: i32) -> essay::Model {
        essay::Model {
            id: id.to_string(),
            author_id: "u1".to_string(),
            title: "Notes on the examined life".to_string(),
            body: "Socrates held that the unexamined life is not worth living.".to_string(),
            kind: EssayKind::Reflection,
            category: Category::Ethics,
            published: true,
            insightful: 0,
            not_helpful: 0,
            views,
            comment_count: 0,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_parse_kind_label() {
        assert_eq!(parse_label::<EssayKind>("dialogue"), Some(EssayKind::Dialogue));
        assert_eq!(parse_label::<EssayKind>("sonnet"), None);
    }

    #[tokio::test]
    async fn test_get_bumps_views() {
        let essay = create_test_essay("e1", 9);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[essay]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = EssayService::new(EssayRepository::new(db));
        let result = service.get("e1").await.unwrap();

        assert_eq!(result.views, 10);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<essay::Model>::new()])
                .into_connection(),
        );

        let service = EssayService::new(EssayRepository::new(db));
        let result = service.get("missing").await;

        assert!(matches!(
            result,
            Err(lyceum_common::AppError::EssayNotFound(_))
        ));
    }
}
