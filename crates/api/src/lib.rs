//! HTTP API layer for lyceum-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth, posts, essays, comments, users
//! - **Extractors**: Authentication
//! - **Middleware**: Bearer-token resolution, application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
