#![allow(clippy::unused_async)]
//! Integration tests for the Quiver HTTP API.
//!
//! Each test builds its own router over a fresh in-memory store and a fresh
//! version key store, then drives it through `salvo::test`.
//!
//! ```sh
//! cargo test -p quiver-test --test integration
//! ```

mod end_to_end;
mod helpers;
mod integrity;
mod spaces;
