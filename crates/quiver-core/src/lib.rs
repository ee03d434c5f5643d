//! Shared configuration, route constants and error types for Quiver.

pub mod config;
pub mod constants;
pub mod error;
