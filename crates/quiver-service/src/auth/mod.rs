//! Authentication and authorization flow.
//!
//! ## Module Organization
//!
//! - `api_key`: API key generation and constant-time lookup
//! - `depot`: Helpers for reading the resolved principal from Salvo requests
//! - `guard`: Per-space read/write decisions (`SpaceAccessGuard`)
//! - `password`: Password hashing and verification with Argon2
//! - `principal`: The `Owner` / `Admin` / `Anonymous` principal
//! - `resolve`: Credential-to-principal resolution (`AuthResolver`)
//! - `service`: The bundle of auth services shared by requests
//! - `token`: Signed, expiring bearer tokens

pub mod api_key;
pub mod depot;
pub mod guard;
pub mod password;
pub mod principal;
pub mod resolve;
pub mod service;
pub mod token;

// Re-export commonly used types at module level
pub use depot::{get_principal_from_depot, get_user_id_from_depot};
pub use guard::{Access, Decision, Denial, Operation, SpaceAccessGuard};
pub use password::PasswordVerifier;
pub use principal::{Principal, PrincipalView};
pub use resolve::{AuthResolver, Credentials, parse_bearer};
pub use service::AuthServices;
pub use token::TokenService;
