//! Account administration: listing, inspection, role and activation changes.
//!
//! Gated by `require_roles(admin)` at the router; creation goes through
//! [`AccountService::register`](super::account_service::AccountService::register)
//! with an administrator registrar.

use std::sync::Arc;

use kernel::id::{AccountId, CompanyId, CountryId};

use crate::domain::entity::{Account, AuthenticatedIdentity};
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{PersonName, Role};
use crate::error::{AuthError, AuthResult};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Absent fields are kept. `Some(None)` clears an organisation reference.
#[derive(Default)]
pub struct AdminAccountUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub country_id: Option<Option<i64>>,
    pub company_id: Option<Option<i64>>,
}

pub struct AccountAdminUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> AccountAdminUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// `limit` defaults to 10 and is clamped to 1..=100; `offset` floors at 0.
    pub async fn list(&self, limit: Option<i64>, offset: Option<i64>) -> AuthResult<AccountPage> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);
        let (accounts, total) = self.repo.list(limit, offset).await?;
        tracing::debug!(count = accounts.len(), total, limit, offset, "Accounts listed");
        Ok(AccountPage {
            accounts,
            total,
            limit,
            offset,
        })
    }

    pub async fn get(&self, id: AccountId) -> AuthResult<Account> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    pub async fn update(
        &self,
        actor: &AuthenticatedIdentity,
        id: AccountId,
        update: AdminAccountUpdate,
    ) -> AuthResult<Account> {
        let mut account = self.get(id).await?;

        if update.first_name.is_some() || update.last_name.is_some() {
            let first_name = match update.first_name {
                Some(name) => PersonName::new(name, "First name")?,
                None => account.first_name.clone(),
            };
            let last_name = match update.last_name {
                Some(name) => PersonName::new(name, "Last name")?,
                None => account.last_name.clone(),
            };
            account.rename(first_name, last_name);
        }

        if let Some(role) = update.role {
            let role: Role = role.parse()?;
            if actor.owns(id) && role != account.role {
                return Err(AuthError::forbidden("Administrators cannot change their own role"));
            }
            account.set_role(role);
        }

        if let Some(active) = update.is_active {
            if actor.owns(id) && !active {
                return Err(AuthError::forbidden("Administrators cannot deactivate themselves"));
            }
            account.set_active(active);
        }

        if update.country_id.is_some() || update.company_id.is_some() {
            account.relocate(
                update.country_id.map_or(account.country_id, |id| id.map(CountryId::new)),
                update.company_id.map_or(account.company_id, |id| id.map(CompanyId::new)),
            );
        }

        self.repo.update(&account).await?;
        tracing::info!(
            account_id = %account.id,
            by = %actor.id,
            role = %account.role,
            active = account.is_active,
            "Account updated by administrator"
        );
        Ok(account)
    }

    pub async fn delete(&self, actor: &AuthenticatedIdentity, id: AccountId) -> AuthResult<()> {
        if actor.owns(id) {
            return Err(AuthError::forbidden("Administrators cannot delete themselves"));
        }
        if !self.repo.delete(id).await? {
            return Err(AuthError::AccountNotFound);
        }
        tracing::info!(account_id = %id, by = %actor.id, "Account deleted");
        Ok(())
    }
}
