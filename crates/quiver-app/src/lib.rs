//! Quiver HTTP server: request hoops, auth middleware and route handlers.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services_handler;
pub mod store_handler;
