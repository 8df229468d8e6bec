//! Account Service
//!
//! Registration, login and self-service account operations. Password
//! hashing is an explicit step here; the store only ever sees digests.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use kernel::id::{AccountId, CompanyId, CountryId};
use platform::password::{CredentialHasher, PlainPassword};

use crate::application::token_service::{IssuedToken, TokenService};
use crate::domain::entity::{Account, AuthenticatedIdentity, NewAccount};
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{Email, PersonName, Role, Username};
use crate::error::{AuthError, AuthResult, IdentityField};

pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// `None` means the least-privileged role.
    pub role: Option<String>,
    pub country_id: Option<i64>,
    pub company_id: Option<i64>,
}

/// Who is creating the account.
#[derive(Debug, Clone, Copy)]
pub enum Registrar<'a> {
    /// Anonymous sign-up. Limited to [`Role::User`].
    SelfService,
    /// An authenticated administrator; any role may be assigned.
    Administrator(&'a AuthenticatedIdentity),
    /// Startup seeding. No caller to check.
    System,
}

/// The administrator created at startup when its email is not yet taken.
#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub token: IssuedToken,
    pub account: Account,
}

/// `None` keeps a field; `Some(None)` clears an organisation reference.
#[derive(Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country_id: Option<Option<i64>>,
    pub company_id: Option<Option<i64>>,
}

pub struct AccountService<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
    hasher: CredentialHasher,
}

impl<R> AccountService<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>, hasher: CredentialHasher) -> Self {
        Self {
            repo,
            tokens,
            hasher,
        }
    }

    pub async fn register(&self, input: RegisterInput, registrar: Registrar<'_>) -> AuthResult<Account> {
        let email = Email::new(&input.email)?;
        let username = Username::new(&input.username)?;
        let first_name = PersonName::new(&input.first_name, "First name")?;
        let last_name = PersonName::new(&input.last_name, "Last name")?;
        let password = PlainPassword::new(&input.password)?;
        let role = input
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()?
            .unwrap_or_default();

        match registrar {
            Registrar::SelfService if role.is_elevated() => {
                return Err(AuthError::insufficient_permissions());
            }
            Registrar::Administrator(actor) if !actor.role.is_admin() => {
                return Err(AuthError::insufficient_permissions());
            }
            _ => {}
        }

        if self.repo.exists_by_email(&email).await? {
            return Err(AuthError::DuplicateIdentity(IdentityField::Email));
        }
        if self.repo.exists_by_username(&username).await? {
            return Err(AuthError::DuplicateIdentity(IdentityField::Username));
        }

        let digest = self.hasher.hash_blocking(password).await?;

        let account = self
            .repo
            .insert(&NewAccount {
                email,
                username,
                password: digest,
                first_name,
                last_name,
                role,
                country_id: input.country_id.map(CountryId::new),
                company_id: input.company_id.map(CompanyId::new),
            })
            .await?;

        tracing::info!(
            account_id = %account.id,
            role = %account.role,
            by_admin = matches!(registrar, Registrar::Administrator(_)),
            "Account registered"
        );

        Ok(account)
    }

    pub async fn login(&self, input: LoginInput, client_ip: Option<IpAddr>) -> AuthResult<LoginOutput> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some(mut account) = self.repo.find_by_email(&email).await? else {
            self.hasher
                .verify_decoy_blocking(PlainPassword::candidate(&input.password))
                .await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !account.can_authenticate() {
            return Err(AuthError::AccountDeactivated);
        }

        let matches = self
            .hasher
            .verify_blocking(account.password.clone(), PlainPassword::candidate(&input.password))
            .await?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        match self.repo.update_last_authenticated(account.id, now).await {
            Ok(()) => account.record_login(now),
            Err(e) => tracing::warn!(
                account_id = %account.id,
                error = %e,
                "Failed to record last login"
            ),
        }

        let token = self.tokens.issue(&account.identity())?;

        tracing::info!(
            account_id = %account.id,
            client_ip = ?client_ip,
            "Account signed in"
        );

        Ok(LoginOutput { token, account })
    }

    /// Create the seeded administrator unless an account already holds its
    /// email. `None` means nothing was created, so startup may call this
    /// every time.
    pub async fn ensure_admin(&self, seed: AdminSeed) -> AuthResult<Option<Account>> {
        let email = Email::new(&seed.email)?;
        if self.repo.exists_by_email(&email).await? {
            tracing::info!("Administrator account already exists");
            return Ok(None);
        }

        let input = RegisterInput {
            email: seed.email,
            username: seed.username,
            password: seed.password,
            first_name: seed.first_name,
            last_name: seed.last_name,
            role: Some(Role::Admin.code().to_owned()),
            country_id: None,
            company_id: None,
        };
        let account = self.register(input, Registrar::System).await?;
        tracing::info!(
            account_id = %account.id,
            username = %account.username,
            "Administrator account created"
        );
        Ok(Some(account))
    }

    /// Re-issue for a caller the middleware already authenticated.
    pub fn refresh_token(&self, identity: &AuthenticatedIdentity) -> AuthResult<IssuedToken> {
        let token = self.tokens.issue(identity)?;
        tracing::debug!(account_id = %identity.id, "Token refreshed");
        Ok(token)
    }

    pub async fn profile(&self, identity: &AuthenticatedIdentity) -> AuthResult<Account> {
        self.load(identity.id).await
    }

    pub async fn update_profile(
        &self,
        identity: &AuthenticatedIdentity,
        update: ProfileUpdate,
    ) -> AuthResult<Account> {
        let mut account = self.load(identity.id).await?;

        let first_name = match update.first_name {
            Some(name) => PersonName::new(name, "First name")?,
            None => account.first_name.clone(),
        };
        let last_name = match update.last_name {
            Some(name) => PersonName::new(name, "Last name")?,
            None => account.last_name.clone(),
        };
        account.rename(first_name, last_name);
        account.relocate(
            update.country_id.map_or(account.country_id, |id| id.map(CountryId::new)),
            update.company_id.map_or(account.company_id, |id| id.map(CompanyId::new)),
        );

        self.repo.update(&account).await?;
        tracing::info!(account_id = %account.id, "Profile updated");
        Ok(account)
    }

    /// Requires the current password; the new one is hashed before storage.
    pub async fn change_password(
        &self,
        identity: &AuthenticatedIdentity,
        current: &str,
        new: &str,
    ) -> AuthResult<()> {
        let account = self.load(identity.id).await?;
        let replacement = PlainPassword::new(new)?;

        let matches = self
            .hasher
            .verify_blocking(account.password.clone(), PlainPassword::candidate(current))
            .await?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let digest = self.hasher.hash_blocking(replacement).await?;
        self.repo.update_password(account.id, &digest).await?;

        tracing::info!(account_id = %account.id, "Password changed");
        Ok(())
    }

    async fn load(&self, id: AccountId) -> AuthResult<Account> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryAccountRepository;
    use crate::tests::fixtures;

    fn service() -> (AccountService<MemoryAccountRepository>, Arc<MemoryAccountRepository>, Arc<TokenService>) {
        let repo = Arc::new(MemoryAccountRepository::new());
        let tokens = Arc::new(TokenService::new(&fixtures::config()).unwrap());
        let service = AccountService::new(repo.clone(), tokens.clone(), CredentialHasher::insecure_fast());
        (service, repo, tokens)
    }

    fn alice() -> RegisterInput {
        fixtures::register_input("a@x.com", "alice", "longenough1")
    }

    fn login(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_register_assigns_id_and_defaults() {
        let (service, _, _) = service();
        let account = service.register(alice(), Registrar::SelfService).await.unwrap();

        assert!(account.id.value() > 0);
        assert_eq!(account.role, Role::User);
        assert!(account.is_active);
        assert_ne!(account.password.as_phc(), "longenough1");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (service, repo, _) = service();
        service.register(alice(), Registrar::SelfService).await.unwrap();

        let again = fixtures::register_input("a@x.com", "alice2", "longenough1");
        let err = service.register(again, Registrar::SelfService).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity(IdentityField::Email)));

        let (_, total) = repo.list(10, 0).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (service, _, _) = service();
        service.register(alice(), Registrar::SelfService).await.unwrap();

        let again = fixtures::register_input("other@x.com", "alice", "longenough1");
        let err = service.register(again, Registrar::SelfService).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity(IdentityField::Username)));
    }

    #[tokio::test]
    async fn test_email_uniqueness_is_case_sensitive() {
        let (service, _, _) = service();
        service.register(alice(), Registrar::SelfService).await.unwrap();

        let upper = fixtures::register_input("A@x.com", "alice2", "longenough1");
        assert!(service.register(upper, Registrar::SelfService).await.is_ok());
    }

    #[tokio::test]
    async fn test_self_service_cannot_claim_admin() {
        let (service, _, _) = service();
        let mut input = alice();
        input.role = Some("admin".into());
        let err = service.register(input, Registrar::SelfService).await.unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(ref m) if m == "Insufficient permissions"));
    }

    #[tokio::test]
    async fn test_admin_may_assign_roles() {
        let (service, _, _) = service();
        let admin = fixtures::identity(1, Role::Admin);
        let mut input = alice();
        input.role = Some("manager".into());
        let account = service
            .register(input, Registrar::Administrator(&admin))
            .await
            .unwrap();
        assert_eq!(account.role, Role::Manager);

        let manager = fixtures::identity(2, Role::Manager);
        let mut input = fixtures::register_input("c@x.com", "carol", "longenough1");
        input.role = Some("admin".into());
        assert!(service.register(input, Registrar::Administrator(&manager)).await.is_err());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (service, _, _) = service();
        let cases = [
            fixtures::register_input("not-an-email", "alice", "longenough1"),
            fixtures::register_input("a@x.com", "al", "longenough1"),
            fixtures::register_input("a@x.com", "alice", "short"),
        ];
        for input in cases {
            let err = service.register(input, Registrar::SelfService).await.unwrap_err();
            assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        }

        let mut bad_role = alice();
        bad_role.role = Some("root".into());
        assert!(matches!(
            service.register(bad_role, Registrar::SelfService).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let (service, repo, tokens) = service();
        let registered = service.register(alice(), Registrar::SelfService).await.unwrap();

        let out = service.login(login("a@x.com", "longenough1"), None).await.unwrap();
        assert_eq!(out.account.id, registered.id);
        assert!(out.account.last_login_at.is_some());

        let resolved = tokens.resolve_account(repo.as_ref(), &out.token.token).await.unwrap();
        assert_eq!(resolved.id, registered.id);
        assert!(resolved.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _, _) = service();
        service.register(alice(), Registrar::SelfService).await.unwrap();

        let wrong_password = service.login(login("a@x.com", "wrong"), None).await.unwrap_err();
        let no_such_email = service.login(login("nobody@x.com", "longenough1"), None).await.unwrap_err();
        let malformed = service.login(login("nobody", "longenough1"), None).await.unwrap_err();

        for err in [&wrong_password, &no_such_email, &malformed] {
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        assert_eq!(
            wrong_password.to_app_error().message(),
            no_such_email.to_app_error().message()
        );
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies_a_password() {
        let repo = Arc::new(MemoryAccountRepository::new());
        let tokens = Arc::new(TokenService::new(&fixtures::config()).unwrap());
        let hasher = CredentialHasher::insecure_fast();
        let service = AccountService::new(repo, tokens, hasher.clone());
        service.register(alice(), Registrar::SelfService).await.unwrap();

        let err = service.login(login("a@x.com", "wrong"), None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(hasher.decoy().is_none());

        let err = service.login(login("nobody@x.com", "longenough1"), None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(hasher.decoy().is_some());
    }

    #[tokio::test]
    async fn test_login_deactivated() {
        let (service, repo, _) = service();
        let mut account = service.register(alice(), Registrar::SelfService).await.unwrap();
        account.set_active(false);
        repo.update(&account).await.unwrap();

        let err = service.login(login("a@x.com", "longenough1"), None).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountDeactivated));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_token_for_same_account() {
        let (service, repo, tokens) = service();
        let account = service.register(alice(), Registrar::SelfService).await.unwrap();
        let first = service.login(login("a@x.com", "longenough1"), None).await.unwrap();

        let refreshed = service.refresh_token(&account.identity()).unwrap();
        assert_ne!(refreshed.token, first.token.token);
        let resolved = tokens.resolve_account(repo.as_ref(), &refreshed.token).await.unwrap();
        assert_eq!(resolved.id, account.id);
    }

    #[tokio::test]
    async fn test_change_password() {
        let (service, _, _) = service();
        let account = service.register(alice(), Registrar::SelfService).await.unwrap();
        let me = account.identity();

        let err = service.change_password(&me, "wrong-current", "brandnew123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        service.change_password(&me, "longenough1", "brandnew123").await.unwrap();
        assert!(service.login(login("a@x.com", "longenough1"), None).await.is_err());
        assert!(service.login(login("a@x.com", "brandnew123"), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_keeps_unset_fields() {
        let (service, _, _) = service();
        let account = service.register(alice(), Registrar::SelfService).await.unwrap();

        let updated = service
            .update_profile(
                &account.identity(),
                ProfileUpdate {
                    last_name: Some("Pleasance".into()),
                    country_id: Some(Some(4)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name.as_str(), "Alice");
        assert_eq!(updated.last_name.as_str(), "Pleasance");
        assert_eq!(updated.country_id, Some(CountryId::new(4)));
        assert_eq!(updated.company_id, None);
    }

    #[tokio::test]
    async fn test_update_profile_clears_organisation() {
        let (service, _, _) = service();
        let mut input = alice();
        input.country_id = Some(4);
        input.company_id = Some(9);
        let account = service.register(input, Registrar::SelfService).await.unwrap();

        let updated = service
            .update_profile(
                &account.identity(),
                ProfileUpdate {
                    country_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.country_id, None);
        assert_eq!(updated.company_id, Some(CompanyId::new(9)));
    }

    fn seed() -> AdminSeed {
        AdminSeed {
            email: "admin@x.com".into(),
            username: "admin".into(),
            password: "admin123456".into(),
            first_name: "Admin".into(),
            last_name: "User".into(),
        }
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let (service, repo, _) = service();

        let created = service.ensure_admin(seed()).await.unwrap().unwrap();
        assert_eq!(created.role, Role::Admin);
        assert!(service.login(login("admin@x.com", "admin123456"), None).await.is_ok());

        assert!(service.ensure_admin(seed()).await.unwrap().is_none());
        let (_, total) = repo.list(10, 0).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_ensure_admin_validates_seed() {
        let (service, _, _) = service();
        let mut weak = seed();
        weak.password = "short".into();
        let err = service.ensure_admin(weak).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(!format!("{:?}", seed()).contains("admin123456"));
    }
}
