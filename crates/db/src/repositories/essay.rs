//! Essay repository.

use std::sync::Arc;

use crate::entities::{Essay, essay};
use lyceum_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Essay repository for database operations.
#[derive(Clone)]
pub struct EssayRepository {
    db: Arc<DatabaseConnection>,
}

impl EssayRepository {
    /// Create a new essay repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an essay by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<essay::Model>> {
        Essay::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an essay by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<essay::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::EssayNotFound(id.to_string()))
    }

    /// Create a new essay.
    pub async fn create(&self, model: essay::ActiveModel) -> AppResult<essay::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List published essays newest-first with offset pagination and
    /// optional category/kind filters. Returns the page and the total count.
    pub async fn list_published(
        &self,
        category: Option<essay::Category>,
        kind: Option<essay::EssayKind>,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<essay::Model>, u64)> {
        let mut query = Essay::find().filter(essay::Column::Published.eq(true));
        if let Some(category) = category {
            query = query.filter(essay::Column::Category.eq(category));
        }
        if let Some(kind) = kind {
            query = query.filter(essay::Column::Kind.eq(kind));
        }

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let essays = query
            .order_by_desc(essay::Column::CreatedAt)
            .offset(page.saturating_sub(1) * limit)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((essays, total))
    }

    /// Get a user's most recent published essays.
    pub async fn find_recent_published_by_author(
        &self,
        author_id: &str,
        limit: u64,
    ) -> AppResult<Vec<essay::Model>> {
        Essay::find()
            .filter(essay::Column::AuthorId.eq(author_id))
            .filter(essay::Column::Published.eq(true))
            .order_by_desc(essay::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's published essays.
    pub async fn count_published_by_author(&self, author_id: &str) -> AppResult<u64> {
        Essay::find()
            .filter(essay::Column::AuthorId.eq(author_id))
            .filter(essay::Column::Published.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of view counts across a user's essays.
    pub async fn sum_views_by_author(&self, author_id: &str) -> AppResult<i64> {
        let total: Option<Option<i64>> = Essay::find()
            .select_only()
            .column_as(essay::Column::Views.sum(), "total")
            .filter(essay::Column::AuthorId.eq(author_id))
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(total.flatten().unwrap_or(0))
    }

    /// Sum of insightful counts across a user's essays.
    pub async fn sum_insightful_by_author(&self, author_id: &str) -> AppResult<i64> {
        let total: Option<Option<i64>> = Essay::find()
            .select_only()
            .column_as(essay::Column::Insightful.sum(), "total")
            .filter(essay::Column::AuthorId.eq(author_id))
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(total.flatten().unwrap_or(0))
    }

    /// Increment view count atomically (single UPDATE query, no fetch).
    pub async fn increment_views(&self, id: &str) -> AppResult<()> {
        Essay::update_many()
            .col_expr(essay::Column::Views, Expr::col(essay::Column::Views).add(1))
            .filter(essay::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment comment count atomically (single UPDATE query, no fetch).
    pub async fn increment_comment_count(&self, id: &str) -> AppResult<()> {
        Essay::update_many()
            .col_expr(
                essay::Column::CommentCount,
                Expr::col(essay::Column::CommentCount).add(1),
            )
            .filter(essay::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all essays by an author. Returns the number of rows removed.
    pub async fn delete_by_author(&self, author_id: &str) -> AppResult<u64> {
        let result = Essay::delete_many()
            .filter(essay::Column::AuthorId.eq(author_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
