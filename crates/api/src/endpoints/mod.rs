//! API endpoints.

mod auth;
mod comments;
mod essays;
mod posts;
mod users;

use axum::Router;
use lyceum_common::{AppError, AppResult};
use lyceum_db::entities::reaction::ReactionKind;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/posts", posts::router())
        .nest("/essays", essays::router())
        .nest("/comments", comments::router())
        .nest("/users", users::router())
}

/// Parse a qualitative reaction label from the wire.
pub(crate) fn parse_reaction_label(label: &str) -> AppResult<ReactionKind> {
    match label {
        "insightful" => Ok(ReactionKind::Insightful),
        "notHelpful" => Ok(ReactionKind::NotHelpful),
        _ => Err(AppError::Validation(format!(
            "Invalid reaction type. Must be \"insightful\" or \"notHelpful\", got \"{label}\""
        ))),
    }
}

/// Parse a signed vote value from the wire.
pub(crate) fn parse_vote_value(value: i32) -> AppResult<ReactionKind> {
    match value {
        1 => Ok(ReactionKind::Up),
        -1 => Ok(ReactionKind::Down),
        _ => Err(AppError::Validation(format!(
            "Invalid vote type. Must be 1 or -1, got {value}"
        ))),
    }
}
