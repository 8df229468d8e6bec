//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use middleware::{
    AuthAppState, ClientAddr, RoleGuard, authenticated, require_auth, require_roles, restricted,
};
pub use router::{admin_router, auth_router};
