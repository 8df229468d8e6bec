//! Application Layer
//!
//! Use cases over the domain, wired per request by the presentation layer.

pub mod access;
pub mod account_admin;
pub mod account_service;
pub mod config;
pub mod token_service;

pub use access::{ensure_owner, ensure_role};
pub use account_admin::{AccountAdminUseCase, AccountPage, AdminAccountUpdate};
pub use account_service::{
    AccountService, AdminSeed, LoginInput, LoginOutput, ProfileUpdate, RegisterInput, Registrar,
};
pub use config::{AuthConfig, OwnershipPolicy};
pub use token_service::{Claims, IssuedToken, TokenService};
