//! Authentication and authorization for the tracker backend.
//!
//! Clean Architecture structure:
//! - `domain/` - accounts, identities, value objects, the credential store contract
//! - `application/` - token service, account service, administration, access checks
//! - `infra/` - PostgreSQL and in-memory credential stores
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Security Model
//! - Bearer tokens are HMAC-signed JWTs with fixed issuer and audience
//! - Every authenticated request re-reads the account, so deactivation is immediate
//! - Passwords hashed with Argon2id; digests never leave the crate
//! - Role gates run as middleware, ownership checks in the owning feature

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

pub use application::access::{ensure_owner, ensure_role};
pub use application::config::{AuthConfig, OwnershipPolicy};
pub use domain::entity::AuthenticatedIdentity;
pub use domain::repository::{AccountLinks, AccountRepository};
pub use domain::value_object::Role;
pub use error::{AuthError, AuthResult};
pub use infra::memory::MemoryAccountRepository;
pub use infra::postgres::PgAccountRepository;
pub use presentation::middleware::{AuthAppState, authenticated};
pub use presentation::router::{admin_router, auth_router};
