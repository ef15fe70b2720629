//! Reaction ledger repository.

use std::sync::Arc;

use crate::entities::{Reaction, reaction};
use lyceum_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
};

/// Reaction repository for database operations.
///
/// The toggle/switch write path runs transactionally in the engagement
/// service; this repository covers the lookup and sweep operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reaction by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<reaction::Model>> {
        Reaction::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the ledger row for a (user, target) pair.
    pub async fn find_by_user_and_target(
        &self,
        user_id: &str,
        target_type: reaction::TargetType,
        target_id: &str,
    ) -> AppResult<Option<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetType.eq(target_type))
            .filter(reaction::Column::TargetId.eq(target_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a user holds any reaction against a target.
    pub async fn has_reacted(
        &self,
        user_id: &str,
        target_type: reaction::TargetType,
        target_id: &str,
    ) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_target(user_id, target_type, target_id)
            .await?
            .is_some())
    }

    /// Create a new ledger row.
    pub async fn create(&self, model: reaction::ActiveModel) -> AppResult<reaction::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a ledger row.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let reaction = self.find_by_id(id).await?;
        if let Some(r) = reaction {
            r.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Delete all ledger rows held by a user. Returns the number removed.
    pub async fn delete_by_user(&self, user_id: &str) -> AppResult<u64> {
        let result = Reaction::delete_many()
            .filter(reaction::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::reaction::{ReactionKind, TargetType};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_reaction(
        id: &str,
        user_id: &str,
        target_type: TargetType,
        target_id: &str,
        kind: ReactionKind,
    ) -> reaction::Model {
        reaction::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            target_type,
            target_id: target_id.to_string(),
            kind,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_target() {
        let r = create_test_reaction("r1", "u1", TargetType::Post, "p1", ReactionKind::Insightful);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r]])
                .into_connection(),
        );

        let repo = ReactionRepository::new(db);
        let result = repo
            .find_by_user_and_target("u1", TargetType::Post, "p1")
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().kind, ReactionKind::Insightful);
    }

    #[tokio::test]
    async fn test_has_reacted_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<reaction::Model>::new()])
                .into_connection(),
        );

        let repo = ReactionRepository::new(db);
        let result = repo
            .has_reacted("u1", TargetType::Comment, "c1")
            .await
            .unwrap();

        assert!(!result);
    }
}
