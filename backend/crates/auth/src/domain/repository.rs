//! Credential store contract.
//!
//! Implemented by `infra::postgres::PgAccountRepository` and
//! `infra::memory::MemoryAccountRepository`; the binary picks one at startup.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, CompanyId, CountryId};
use platform::password::PasswordDigest;

use crate::domain::entity::{Account, NewAccount};
use crate::domain::value_object::{Email, Username};
use crate::error::AuthResult;

#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    async fn find_by_id(&self, id: AccountId) -> AuthResult<Option<Account>>;

    /// Exact, case-sensitive match.
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<Account>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool>;

    /// Store a new account. A uniqueness collision is `AuthError::DuplicateIdentity`;
    /// an organisation id naming no row is `AuthError::unknown_reference`.
    async fn insert(&self, account: &NewAccount) -> AuthResult<Account>;

    async fn update_last_authenticated(&self, id: AccountId, at: DateTime<Utc>) -> AuthResult<()>;

    /// Persist profile, role, activation and organisation fields.
    async fn update(&self, account: &Account) -> AuthResult<()>;

    async fn update_password(&self, id: AccountId, digest: &PasswordDigest) -> AuthResult<()>;

    /// Page ordered by id, plus the total row count.
    async fn list(&self, limit: i64, offset: i64) -> AuthResult<(Vec<Account>, i64)>;

    /// `false` when no such account existed.
    async fn delete(&self, id: AccountId) -> AuthResult<bool>;
}

/// Rows kept outside the credential store that accounts point at or own.
///
/// The Postgres schema covers this with foreign keys. The in-memory store
/// asks an implementation instead.
#[trait_variant::make(AccountLinks: Send)]
pub trait LocalAccountLinks {
    async fn country_exists(&self, id: CountryId) -> AuthResult<bool>;

    async fn company_exists(&self, id: CompanyId) -> AuthResult<bool>;

    /// Drop whatever the deleted account owned.
    async fn release_account(&self, id: AccountId) -> AuthResult<()>;
}
