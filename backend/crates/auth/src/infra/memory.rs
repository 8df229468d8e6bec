//! In-process credential store.
//!
//! Same uniqueness rules as the Postgres schema. Foreign keys are checked
//! through an [`AccountLinks`] implementation, [`Unlinked`] by default.
//! Used by `DB_DRIVER=memory` and by the test suites.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, CompanyId, CountryId};
use platform::password::PasswordDigest;
use tokio::sync::RwLock;

use crate::domain::entity::{Account, NewAccount};
use crate::domain::repository::{AccountLinks, AccountRepository};
use crate::domain::value_object::{Email, Username};
use crate::error::{AuthError, AuthResult, IdentityField};

#[derive(Default)]
struct Accounts {
    last_id: i64,
    rows: BTreeMap<AccountId, Account>,
}

/// Accepts every organisation id and owns nothing outside the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlinked;

impl AccountLinks for Unlinked {
    async fn country_exists(&self, _id: CountryId) -> AuthResult<bool> {
        Ok(true)
    }

    async fn company_exists(&self, _id: CompanyId) -> AuthResult<bool> {
        Ok(true)
    }

    async fn release_account(&self, _id: AccountId) -> AuthResult<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryAccountRepository<L = Unlinked> {
    inner: Arc<RwLock<Accounts>>,
    links: L,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L> MemoryAccountRepository<L>
where
    L: AccountLinks + Sync,
{
    pub fn linked(links: L) -> Self {
        Self {
            inner: Arc::default(),
            links,
        }
    }

    async fn check_references(
        &self,
        country_id: Option<CountryId>,
        company_id: Option<CompanyId>,
    ) -> AuthResult<()> {
        if let Some(id) = country_id {
            if !self.links.country_exists(id).await? {
                return Err(AuthError::unknown_reference());
            }
        }
        if let Some(id) = company_id {
            if !self.links.company_exists(id).await? {
                return Err(AuthError::unknown_reference());
            }
        }
        Ok(())
    }
}

impl<L> AccountRepository for MemoryAccountRepository<L>
where
    L: AccountLinks + Sync,
{
    async fn find_by_id(&self, id: AccountId) -> AuthResult<Option<Account>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let guard = self.inner.read().await;
        Ok(guard.rows.values().find(|a| &a.email == email).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<Account>> {
        let guard = self.inner.read().await;
        Ok(guard.rows.values().find(|a| &a.username == username).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let guard = self.inner.read().await;
        Ok(guard.rows.values().any(|a| &a.email == email))
    }

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool> {
        let guard = self.inner.read().await;
        Ok(guard.rows.values().any(|a| &a.username == username))
    }

    async fn insert(&self, account: &NewAccount) -> AuthResult<Account> {
        self.check_references(account.country_id, account.company_id)
            .await?;
        let mut guard = self.inner.write().await;

        if guard.rows.values().any(|a| a.email == account.email) {
            return Err(AuthError::DuplicateIdentity(IdentityField::Email));
        }
        if guard.rows.values().any(|a| a.username == account.username) {
            return Err(AuthError::DuplicateIdentity(IdentityField::Username));
        }

        guard.last_id += 1;
        let id = AccountId::new(guard.last_id);
        let stored = account.clone().into_account(id, Utc::now());
        guard.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_last_authenticated(&self, id: AccountId, at: DateTime<Utc>) -> AuthResult<()> {
        let mut guard = self.inner.write().await;
        let account = guard.rows.get_mut(&id).ok_or(AuthError::AccountNotFound)?;
        account.record_login(at);
        Ok(())
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        // Only references that change are checked, as with an UPDATE in Postgres.
        let (country_id, company_id) = self
            .inner
            .read()
            .await
            .rows
            .get(&account.id)
            .map(|a| (a.country_id, a.company_id))
            .ok_or(AuthError::AccountNotFound)?;
        self.check_references(
            account.country_id.filter(|id| Some(*id) != country_id),
            account.company_id.filter(|id| Some(*id) != company_id),
        )
        .await?;

        let mut guard = self.inner.write().await;
        let stored = guard
            .rows
            .get_mut(&account.id)
            .ok_or(AuthError::AccountNotFound)?;
        stored.first_name = account.first_name.clone();
        stored.last_name = account.last_name.clone();
        stored.role = account.role;
        stored.is_active = account.is_active;
        stored.country_id = account.country_id;
        stored.company_id = account.company_id;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn update_password(&self, id: AccountId, digest: &PasswordDigest) -> AuthResult<()> {
        let mut guard = self.inner.write().await;
        let stored = guard.rows.get_mut(&id).ok_or(AuthError::AccountNotFound)?;
        stored.password = digest.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> AuthResult<(Vec<Account>, i64)> {
        let guard = self.inner.read().await;
        let total = guard.rows.len() as i64;
        let page = guard
            .rows
            .values()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn delete(&self, id: AccountId) -> AuthResult<bool> {
        let removed = self.inner.write().await.rows.remove(&id).is_some();
        if removed {
            self.links.release_account(id).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::Role;
    use crate::tests::fixtures;

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let repo = MemoryAccountRepository::new();
        let a = fixtures::seed_account(&repo, "a@x.com", "alice", Role::User).await;
        let b = fixtures::seed_account(&repo, "b@x.com", "bob", Role::User).await;
        assert_eq!(a.id.value() + 1, b.id.value());
    }

    #[tokio::test]
    async fn test_lookups() {
        let repo = MemoryAccountRepository::new();
        let a = fixtures::seed_account(&repo, "a@x.com", "alice", Role::User).await;

        let email = Email::new("a@x.com").unwrap();
        let username = Username::new("alice").unwrap();
        assert_eq!(repo.find_by_email(&email).await.unwrap().unwrap().id, a.id);
        assert_eq!(repo.find_by_username(&username).await.unwrap().unwrap().id, a.id);
        assert!(repo.exists_by_email(&email).await.unwrap());
        assert!(repo.exists_by_username(&username).await.unwrap());
        assert!(!repo.exists_by_email(&Email::new("A@x.com").unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_enforces_uniqueness() {
        let repo = MemoryAccountRepository::new();
        fixtures::seed_account(&repo, "a@x.com", "alice", Role::User).await;

        let dup = fixtures::new_account("a@x.com", "someone", Role::User);
        assert!(matches!(
            repo.insert(&dup).await,
            Err(AuthError::DuplicateIdentity(IdentityField::Email))
        ));
        let dup = fixtures::new_account("z@x.com", "alice", Role::User);
        assert!(matches!(
            repo.insert(&dup).await,
            Err(AuthError::DuplicateIdentity(IdentityField::Username))
        ));
    }

    #[tokio::test]
    async fn test_update_last_authenticated_unknown() {
        let repo = MemoryAccountRepository::new();
        assert!(repo
            .update_last_authenticated(AccountId::new(3), Utc::now())
            .await
            .is_err());
    }

    /// Knows countries 1 and 2 and company 10; records released accounts.
    #[derive(Clone, Default)]
    struct Directory {
        released: Arc<RwLock<Vec<AccountId>>>,
    }

    impl AccountLinks for Directory {
        async fn country_exists(&self, id: CountryId) -> AuthResult<bool> {
            Ok(matches!(id.value(), 1 | 2))
        }

        async fn company_exists(&self, id: CompanyId) -> AuthResult<bool> {
            Ok(id.value() == 10)
        }

        async fn release_account(&self, id: AccountId) -> AuthResult<()> {
            self.released.write().await.push(id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_linked_store_rejects_unknown_organisations() {
        let repo = MemoryAccountRepository::linked(Directory::default());

        let mut dangling = fixtures::new_account("a@x.com", "alice", Role::User);
        dangling.country_id = Some(CountryId::new(999));
        let err = repo.insert(&dangling).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(ref m) if m == "Referenced record does not exist"));
        assert_eq!(repo.list(10, 0).await.unwrap().1, 0);

        let mut known = fixtures::new_account("a@x.com", "alice", Role::User);
        known.country_id = Some(CountryId::new(1));
        known.company_id = Some(CompanyId::new(10));
        let mut account = repo.insert(&known).await.unwrap();

        account.relocate(Some(CountryId::new(2)), Some(CompanyId::new(12345)));
        assert!(matches!(
            repo.update(&account).await,
            Err(AuthError::Validation(_))
        ));
        account.relocate(Some(CountryId::new(2)), None);
        repo.update(&account).await.unwrap();
        let stored = repo.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.country_id, Some(CountryId::new(2)));
        assert_eq!(stored.company_id, None);
    }

    #[tokio::test]
    async fn test_delete_releases_owned_rows() {
        let links = Directory::default();
        let repo = MemoryAccountRepository::linked(links.clone());
        let a = fixtures::seed_account(&repo, "a@x.com", "alice", Role::User).await;

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert_eq!(*links.released.read().await, vec![a.id]);
    }
}
