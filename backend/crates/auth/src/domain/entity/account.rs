//! Account Entity
//!
//! The stored identity record. Holds the credential digest, so it has no
//! `Serialize` impl; outward representations go through the DTO layer.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, CompanyId, CountryId};
use platform::password::PasswordDigest;

use crate::domain::entity::identity::AuthenticatedIdentity;
use crate::domain::value_object::{Email, PersonName, Role, Username};

#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub username: Username,
    pub password: PasswordDigest,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub role: Role,
    pub is_active: bool,
    pub country_id: Option<CountryId>,
    pub company_id: Option<CompanyId>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn can_authenticate(&self) -> bool {
        self.is_active
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn identity(&self) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.touch();
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.touch();
    }

    pub fn rename(&mut self, first_name: PersonName, last_name: PersonName) {
        self.first_name = first_name;
        self.last_name = last_name;
        self.touch();
    }

    pub fn relocate(&mut self, country_id: Option<CountryId>, company_id: Option<CompanyId>) {
        self.country_id = country_id;
        self.company_id = company_id;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// An account that has not been stored yet. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub username: Username,
    pub password: PasswordDigest,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub role: Role,
    pub country_id: Option<CountryId>,
    pub company_id: Option<CompanyId>,
}

impl NewAccount {
    /// New accounts always start active.
    pub fn into_account(self, id: AccountId, now: DateTime<Utc>) -> Account {
        Account {
            id,
            email: self.email,
            username: self.username,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            is_active: true,
            country_id: self.country_id,
            company_id: self.company_id,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::{CredentialHasher, PlainPassword};

    fn sample() -> Account {
        let digest = CredentialHasher::insecure_fast()
            .hash(&PlainPassword::new("longenough1").unwrap())
            .unwrap();
        NewAccount {
            email: Email::new("a@x.com").unwrap(),
            username: Username::new("alice").unwrap(),
            password: digest,
            first_name: PersonName::new("Alice", "First name").unwrap(),
            last_name: PersonName::new("Liddell", "Last name").unwrap(),
            role: Role::User,
            country_id: None,
            company_id: None,
        }
        .into_account(AccountId::new(1), Utc::now())
    }

    #[test]
    fn test_new_account_is_active() {
        let account = sample();
        assert!(account.is_active);
        assert!(account.can_authenticate());
        assert!(account.last_login_at.is_none());
        assert_eq!(account.full_name(), "Alice Liddell");
    }

    #[test]
    fn test_identity_mirrors_account() {
        let account = sample();
        let identity = account.identity();
        assert_eq!(identity.id, account.id);
        assert_eq!(identity.email, account.email);
        assert_eq!(identity.role, Role::User);
    }

    #[test]
    fn test_deactivation_blocks_authentication() {
        let mut account = sample();
        let before = account.updated_at;
        account.set_active(false);
        assert!(!account.can_authenticate());
        assert!(account.updated_at >= before);
    }

    #[test]
    fn test_debug_does_not_leak_digest() {
        let account = sample();
        assert!(!format!("{account:?}").contains("$argon2id$"));
    }
}
