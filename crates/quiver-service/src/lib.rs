//! Access control and cache versioning for Quiver.
//!
//! - `auth`: credentials, principals and the space access guard
//! - `version`: per-category version tokens for client cache invalidation

pub mod auth;
pub mod error;
pub mod version;
