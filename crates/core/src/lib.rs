//! Core business logic for lyceum-rs.

pub mod services;

pub use services::*;
