//! Engagement ledger service.
//!
//! Maintains per-user, per-target reaction state under the
//! one-active-reaction-per-(user, target) invariant and keeps the target's
//! denormalized counters in sync. Posts and essays use the labeled alphabet
//! (insightful / notHelpful over two counters); comments use the signed
//! alphabet (up / down over one signed tally). The ledger row change and
//! the counter update run in a single transaction, retried a bounded number
//! of times on write conflicts.

use std::sync::Arc;

use lyceum_common::{AppError, AppResult, IdGenerator};
use lyceum_db::{
    entities::{
        Comment, Essay, Post, Reaction,
        comment, essay, post,
        reaction::{self, ReactionKind, TargetType},
    },
    repositories::{CommentRepository, EssayRepository, PostRepository},
};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait,
    sea_query::{Expr, SimpleExpr},
};
use serde::Serialize;

/// Bounded optimistic retry budget for conflicting reaction writes.
const MAX_REACT_ATTEMPTS: u32 = 3;

/// A reaction target, tagged by content kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A forum post.
    Post(String),
    /// A long-form essay.
    Essay(String),
    /// A comment on either.
    Comment(String),
}

impl Target {
    /// The ledger's target-type discriminant.
    #[must_use]
    pub const fn target_type(&self) -> TargetType {
        match self {
            Self::Post(_) => TargetType::Post,
            Self::Essay(_) => TargetType::Essay,
            Self::Comment(_) => TargetType::Comment,
        }
    }

    /// The target's ID.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Post(id) | Self::Essay(id) | Self::Comment(id) => id,
        }
    }

    const fn scheme(&self) -> Scheme {
        match self {
            Self::Post(_) | Self::Essay(_) => Scheme::Labeled,
            Self::Comment(_) => Scheme::Signed,
        }
    }
}

/// Reaction scheme: which alphabet and counter representation a target uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    /// insightful / notHelpful over two non-negative counters.
    Labeled,
    /// up / down collapsed onto one signed counter.
    Signed,
}

const fn kind_in_scheme(kind: ReactionKind, scheme: Scheme) -> bool {
    matches!(
        (kind, scheme),
        (
            ReactionKind::Insightful | ReactionKind::NotHelpful,
            Scheme::Labeled
        ) | (ReactionKind::Up | ReactionKind::Down, Scheme::Signed)
    )
}

const fn signed_value(kind: ReactionKind) -> i32 {
    match kind {
        ReactionKind::Up => 1,
        ReactionKind::Down => -1,
        ReactionKind::Insightful | ReactionKind::NotHelpful => 0,
    }
}

/// Ledger-row effect of applying a requested reaction to the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// No prior reaction: a row holding the requested kind is created.
    Create,
    /// Same reaction again: the row is removed (toggle-off).
    Remove,
    /// A different reaction was held: the row switches to the requested kind.
    Switch {
        /// The previously held reaction.
        from: ReactionKind,
    },
}

fn transition(current: Option<ReactionKind>, requested: ReactionKind) -> Transition {
    match current {
        None => Transition::Create,
        Some(held) if held == requested => Transition::Remove,
        Some(held) => Transition::Switch { from: held },
    }
}

/// Per-label counter deltas for the labeled scheme. Each delta is ±1.
fn labeled_deltas(step: Transition, requested: ReactionKind) -> Vec<(ReactionKind, i32)> {
    match step {
        Transition::Create => vec![(requested, 1)],
        Transition::Remove => vec![(requested, -1)],
        Transition::Switch { from } => vec![(from, -1), (requested, 1)],
    }
}

/// Single-counter delta for the signed scheme. The switch case applies
/// `2 * requested` in one step, which equals `-held + requested` because the
/// two signed labels are each other's negation.
const fn signed_delta(step: Transition, requested: ReactionKind) -> i32 {
    let value = signed_value(requested);
    match step {
        Transition::Create => value,
        Transition::Remove => -value,
        Transition::Switch { .. } => 2 * value,
    }
}

/// Updated counter values for the reacted-to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EngagementCounters {
    /// Labeled-scheme counters (posts, essays).
    #[serde(rename_all = "camelCase")]
    Labeled {
        /// Insightful count.
        insightful: i32,
        /// Not-helpful count.
        not_helpful: i32,
    },
    /// Signed-scheme tally (comments).
    Signed {
        /// Net vote tally.
        votes: i32,
    },
}

/// Engagement ledger service.
#[derive(Clone)]
pub struct EngagementService {
    db: Arc<DatabaseConnection>,
    post_repo: PostRepository,
    essay_repo: EssayRepository,
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

impl EngagementService {
    /// Create a new engagement service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        post_repo: PostRepository,
        essay_repo: EssayRepository,
        comment_repo: CommentRepository,
    ) -> Self {
        Self {
            db,
            post_repo,
            essay_repo,
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Apply a reaction from a user to a target.
    ///
    /// First reaction creates the ledger row, repeating it toggles it off,
    /// a different label switches the row. Returns the target's updated
    /// counter values.
    pub async fn react(
        &self,
        user_id: &str,
        target: &Target,
        requested: ReactionKind,
    ) -> AppResult<EngagementCounters> {
        if !kind_in_scheme(requested, target.scheme()) {
            return Err(AppError::Validation(format!(
                "Reaction \"{}\" is not valid for this target",
                requested.to_value()
            )));
        }

        self.ensure_target_exists(target).await?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_react(user_id, target, requested).await {
                Err(AppError::Conflict(_)) if attempt < MAX_REACT_ATTEMPTS => {
                    tracing::debug!(attempt, user_id, "Retrying reaction after write conflict");
                }
                result => return result,
            }
        }
    }

    async fn ensure_target_exists(&self, target: &Target) -> AppResult<()> {
        match target {
            Target::Post(id) => self.post_repo.get_by_id(id).await.map(|_| ()),
            Target::Essay(id) => self.essay_repo.get_by_id(id).await.map(|_| ()),
            Target::Comment(id) => self.comment_repo.get_by_id(id).await.map(|_| ()),
        }
    }

    /// One transactional attempt: read ledger state, apply the row change
    /// and the counter update together, return the fresh counters.
    async fn try_react(
        &self,
        user_id: &str,
        target: &Target,
        requested: ReactionKind,
    ) -> AppResult<EngagementCounters> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let existing = Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetType.eq(target.target_type()))
            .filter(reaction::Column::TargetId.eq(target.id()))
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let step = transition(existing.as_ref().map(|r| r.kind), requested);

        match (step, existing) {
            (Transition::Create, None) => {
                let model = reaction::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.to_string()),
                    target_type: Set(target.target_type()),
                    target_id: Set(target.id().to_string()),
                    kind: Set(requested),
                    ..Default::default()
                };
                model.insert(&txn).await.map_err(map_ledger_write_err)?;
            }
            (Transition::Remove, Some(row)) => {
                Reaction::delete_by_id(row.id)
                    .exec(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            (Transition::Switch { .. }, Some(row)) => {
                let mut active: reaction::ActiveModel = row.into();
                active.kind = Set(requested);
                active.update(&txn).await.map_err(map_ledger_write_err)?;
            }
            _ => {
                return Err(AppError::Internal(
                    "Ledger state diverged mid-transition".to_string(),
                ));
            }
        }

        let counters = match target {
            Target::Post(id) => apply_post_counters(&txn, id, step, requested).await?,
            Target::Essay(id) => apply_essay_counters(&txn, id, step, requested).await?,
            Target::Comment(id) => apply_comment_counter(&txn, id, step, requested).await?,
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(counters)
    }
}

/// Map a unique-index violation (a concurrent duplicate from the same user)
/// to a retryable conflict; everything else stays a database error.
fn map_ledger_write_err(e: sea_orm::DbErr) -> AppError {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        AppError::Conflict("Reaction was modified concurrently, try again".to_string())
    } else {
        AppError::Database(e.to_string())
    }
}

/// Decrement expression that never takes a labeled counter below zero.
fn labeled_decrement(column_name: &str) -> SimpleExpr {
    Expr::cust(format!("GREATEST({column_name} - 1, 0)"))
}

async fn apply_post_counters(
    txn: &DatabaseTransaction,
    id: &str,
    step: Transition,
    requested: ReactionKind,
) -> AppResult<EngagementCounters> {
    for (kind, delta) in labeled_deltas(step, requested) {
        let (column, name) = match kind {
            ReactionKind::Insightful => (post::Column::Insightful, "insightful"),
            ReactionKind::NotHelpful => (post::Column::NotHelpful, "not_helpful"),
            ReactionKind::Up | ReactionKind::Down => {
                return Err(AppError::Internal(
                    "Signed label reached a labeled target".to_string(),
                ));
            }
        };
        let expr = if delta > 0 {
            Expr::col(column).add(delta)
        } else {
            labeled_decrement(name)
        };
        Post::update_many()
            .col_expr(column, expr)
            .filter(post::Column::Id.eq(id))
            .exec(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
    }

    let post = Post::find_by_id(id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::PostNotFound(id.to_string()))?;

    Ok(EngagementCounters::Labeled {
        insightful: post.insightful,
        not_helpful: post.not_helpful,
    })
}

async fn apply_essay_counters(
    txn: &DatabaseTransaction,
    id: &str,
    step: Transition,
    requested: ReactionKind,
) -> AppResult<EngagementCounters> {
    for (kind, delta) in labeled_deltas(step, requested) {
        let (column, name) = match kind {
            ReactionKind::Insightful => (essay::Column::Insightful, "insightful"),
            ReactionKind::NotHelpful => (essay::Column::NotHelpful, "not_helpful"),
            ReactionKind::Up | ReactionKind::Down => {
                return Err(AppError::Internal(
                    "Signed label reached a labeled target".to_string(),
                ));
            }
        };
        let expr = if delta > 0 {
            Expr::col(column).add(delta)
        } else {
            labeled_decrement(name)
        };
        Essay::update_many()
            .col_expr(column, expr)
            .filter(essay::Column::Id.eq(id))
            .exec(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
    }

    let essay = Essay::find_by_id(id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::EssayNotFound(id.to_string()))?;

    Ok(EngagementCounters::Labeled {
        insightful: essay.insightful,
        not_helpful: essay.not_helpful,
    })
}

async fn apply_comment_counter(
    txn: &DatabaseTransaction,
    id: &str,
    step: Transition,
    requested: ReactionKind,
) -> AppResult<EngagementCounters> {
    let delta = signed_delta(step, requested);

    Comment::update_many()
        .col_expr(
            comment::Column::Votes,
            Expr::col(comment::Column::Votes).add(delta),
        )
        .filter(comment::Column::Id.eq(id))
        .exec(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let comment = Comment::find_by_id(id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::CommentNotFound(id.to_string()))?;

    Ok(EngagementCounters::Signed {
        votes: comment.votes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lyceum_db::entities::post::{Category, PostKind};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    // === State machine ===

    #[test]
    fn test_transition_create() {
        assert_eq!(
            transition(None, ReactionKind::Insightful),
            Transition::Create
        );
    }

    #[test]
    fn test_transition_toggle_off() {
        assert_eq!(
            transition(Some(ReactionKind::Up), ReactionKind::Up),
            Transition::Remove
        );
    }

    #[test]
    fn test_transition_switch() {
        assert_eq!(
            transition(Some(ReactionKind::Insightful), ReactionKind::NotHelpful),
            Transition::Switch {
                from: ReactionKind::Insightful
            }
        );
    }

    #[test]
    fn test_scheme_membership() {
        assert!(kind_in_scheme(ReactionKind::Insightful, Scheme::Labeled));
        assert!(kind_in_scheme(ReactionKind::NotHelpful, Scheme::Labeled));
        assert!(kind_in_scheme(ReactionKind::Up, Scheme::Signed));
        assert!(kind_in_scheme(ReactionKind::Down, Scheme::Signed));
        assert!(!kind_in_scheme(ReactionKind::Up, Scheme::Labeled));
        assert!(!kind_in_scheme(ReactionKind::Insightful, Scheme::Signed));
    }

    // === Counter arithmetic ===

    #[test]
    fn test_labeled_deltas_create() {
        assert_eq!(
            labeled_deltas(Transition::Create, ReactionKind::Insightful),
            vec![(ReactionKind::Insightful, 1)]
        );
    }

    #[test]
    fn test_labeled_deltas_switch() {
        // Switch decrements the held label and increments the requested one.
        assert_eq!(
            labeled_deltas(
                Transition::Switch {
                    from: ReactionKind::Insightful
                },
                ReactionKind::NotHelpful
            ),
            vec![
                (ReactionKind::Insightful, -1),
                (ReactionKind::NotHelpful, 1)
            ]
        );
    }

    #[test]
    fn test_signed_vote_scenario() {
        // Cast +1: counter 0 -> 1.
        let mut votes = 0;
        votes += signed_delta(transition(None, ReactionKind::Up), ReactionKind::Up);
        assert_eq!(votes, 1);

        // Switch to -1: counter 1 + (2 * -1) = -1.
        votes += signed_delta(
            transition(Some(ReactionKind::Up), ReactionKind::Down),
            ReactionKind::Down,
        );
        assert_eq!(votes, -1);

        // -1 again toggles off: counter back to 0.
        votes += signed_delta(
            transition(Some(ReactionKind::Down), ReactionKind::Down),
            ReactionKind::Down,
        );
        assert_eq!(votes, 0);
    }

    #[test]
    fn test_labeled_reaction_scenario() {
        // insightful: {0,0} -> {1,0}; switch to notHelpful: {0,1};
        // notHelpful again: {0,0}.
        let mut insightful = 0;
        let mut not_helpful = 0;
        fn apply(insightful: &mut i32, not_helpful: &mut i32, deltas: Vec<(ReactionKind, i32)>) {
            for (kind, delta) in deltas {
                match kind {
                    ReactionKind::Insightful => *insightful += delta,
                    ReactionKind::NotHelpful => *not_helpful += delta,
                    _ => panic!("signed label in labeled scenario"),
                }
            }
        }

        apply(&mut insightful, &mut not_helpful, labeled_deltas(
            transition(None, ReactionKind::Insightful),
            ReactionKind::Insightful,
        ));
        assert_eq!((insightful, not_helpful), (1, 0));

        apply(&mut insightful, &mut not_helpful, labeled_deltas(
            transition(Some(ReactionKind::Insightful), ReactionKind::NotHelpful),
            ReactionKind::NotHelpful,
        ));
        assert_eq!((insightful, not_helpful), (0, 1));

        apply(&mut insightful, &mut not_helpful, labeled_deltas(
            transition(Some(ReactionKind::NotHelpful), ReactionKind::NotHelpful),
            ReactionKind::NotHelpful,
        ));
        assert_eq!((insightful, not_helpful), (0, 0));
    }

    #[test]
    fn test_toggle_is_idempotent_on_counters() {
        // Any same-label pair of applications nets to zero.
        for kind in [
            ReactionKind::Up,
            ReactionKind::Down,
        ] {
            let first = signed_delta(transition(None, kind), kind);
            let second = signed_delta(transition(Some(kind), kind), kind);
            assert_eq!(first + second, 0);
        }
    }

    // === Service paths ===

    fn create_test_post(id: &str, insightful: i32, not_helpful: i32) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: "author".to_string(),
            title: "On courage".to_string(),
            body: "Is courage the mean between cowardice and rashness?".to_string(),
            kind: PostKind::Question,
            category: Category::Ethics,
            insightful,
            not_helpful,
            views: 0,
            comment_count: 0,
            created_at: Utc::now().into(),
        }
    }

    fn service_over(db: Arc<DatabaseConnection>) -> EngagementService {
        EngagementService::new(
            Arc::clone(&db),
            PostRepository::new(Arc::clone(&db)),
            EssayRepository::new(Arc::clone(&db)),
            CommentRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_react_rejects_wrong_alphabet() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service_over(db);

        let result = service
            .react("u1", &Target::Post("p1".to_string()), ReactionKind::Up)
            .await;

        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("not valid")),
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_react_target_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );
        let service = service_over(db);

        let result = service
            .react(
                "u1",
                &Target::Post("missing".to_string()),
                ReactionKind::Insightful,
            )
            .await;

        match result {
            Err(AppError::PostNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected PostNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_react_first_reaction_creates_row_and_increments() {
        let before = create_test_post("p1", 0, 0);
        let after = create_test_post("p1", 1, 0);
        let inserted = reaction::Model {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            target_type: TargetType::Post,
            target_id: "p1".to_string(),
            kind: ReactionKind::Insightful,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // existence pre-check
                .append_query_results([[before]])
                // ledger lookup inside the transaction: no prior row
                .append_query_results([Vec::<reaction::Model>::new()])
                // ledger INSERT .. RETURNING
                .append_query_results([[inserted]])
                // counter read-back after the update
                .append_query_results([[after]])
                // counter update
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = service_over(db);

        let counters = service
            .react(
                "u1",
                &Target::Post("p1".to_string()),
                ReactionKind::Insightful,
            )
            .await
            .unwrap();

        assert_eq!(
            counters,
            EngagementCounters::Labeled {
                insightful: 1,
                not_helpful: 0
            }
        );
    }

    #[tokio::test]
    async fn test_react_toggle_off_removes_row() {
        let comment_before = comment::Model {
            id: "c1".to_string(),
            author_id: "author".to_string(),
            post_id: Some("p1".to_string()),
            essay_id: None,
            parent_id: None,
            body: "A fine point".to_string(),
            votes: 1,
            created_at: Utc::now().into(),
        };
        let comment_after = comment::Model {
            votes: 0,
            ..comment_before.clone()
        };
        let held = reaction::Model {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            target_type: TargetType::Comment,
            target_id: "c1".to_string(),
            kind: ReactionKind::Up,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment_before]])
                .append_query_results([[held]])
                .append_query_results([[comment_after]])
                .append_exec_results([
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

        let counters = service
            .react("u1", &Target::Comment("c1".to_string()), ReactionKind::Up)
            .await
            .unwrap();

        assert_eq!(counters, EngagementCounters::Signed { votes: 0 });
    }
}
