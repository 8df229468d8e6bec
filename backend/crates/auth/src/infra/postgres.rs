//! PostgreSQL credential store.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, CompanyId, CountryId};
use platform::password::PasswordDigest;
use sqlx::PgPool;

use crate::domain::entity::{Account, NewAccount};
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{Email, PersonName, Role, Username};
use crate::error::{AuthError, AuthResult, IdentityField};

const EMAIL_CONSTRAINT: &str = "accounts_email_key";
const USERNAME_CONSTRAINT: &str = "accounts_username_key";

macro_rules! select_accounts {
    ($tail:literal) => {
        concat!(
            r#"
            SELECT
                id,
                email,
                username,
                password_hash,
                first_name,
                last_name,
                role,
                is_active,
                country_id,
                company_id,
                last_login_at,
                created_at,
                updated_at
            FROM accounts
            "#,
            $tail
        )
    };
}

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AccountRepository for PgAccountRepository {
    async fn find_by_id(&self, id: AccountId) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(select_accounts!("WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(select_accounts!("WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(select_accounts!("WHERE username = $1"))
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)")
                .bind(username.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert(&self, account: &NewAccount) -> AuthResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (
                email,
                username,
                password_hash,
                first_name,
                last_name,
                role,
                is_active,
                country_id,
                company_id
            ) VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8)
            RETURNING
                id,
                email,
                username,
                password_hash,
                first_name,
                last_name,
                role,
                is_active,
                country_id,
                company_id,
                last_login_at,
                created_at,
                updated_at
            "#,
        )
        .bind(account.email.as_str())
        .bind(account.username.as_str())
        .bind(account.password.as_phc())
        .bind(account.first_name.as_str())
        .bind(account.last_name.as_str())
        .bind(account.role.code())
        .bind(account.country_id.map(CountryId::value))
        .bind(account.company_id.map(CompanyId::value))
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.into_account()
    }

    async fn update_last_authenticated(&self, id: AccountId, at: DateTime<Utc>) -> AuthResult<()> {
        let result = sqlx::query("UPDATE accounts SET last_login_at = $2 WHERE id = $1")
            .bind(id.value())
            .bind(at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::AccountNotFound);
        }
        Ok(())
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                first_name = $2,
                last_name = $3,
                role = $4,
                is_active = $5,
                country_id = $6,
                company_id = $7,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(account.id.value())
        .bind(account.first_name.as_str())
        .bind(account.last_name.as_str())
        .bind(account.role.code())
        .bind(account.is_active)
        .bind(account.country_id.map(CountryId::value))
        .bind(account.company_id.map(CompanyId::value))
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::AccountNotFound);
        }
        Ok(())
    }

    async fn update_password(&self, id: AccountId, digest: &PasswordDigest) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.value())
        .bind(digest.as_phc())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::AccountNotFound);
        }
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> AuthResult<(Vec<Account>, i64)> {
        let rows = sqlx::query_as::<_, AccountRow>(select_accounts!(
            "ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        let accounts = rows
            .into_iter()
            .map(AccountRow::into_account)
            .collect::<AuthResult<Vec<_>>>()?;
        Ok((accounts, total))
    }

    async fn delete(&self, id: AccountId) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Unique constraints become the duplicate-identity error; a dangling
/// `country_id` or `company_id` is a validation error.
fn map_write_error(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            match db.constraint() {
                Some(EMAIL_CONSTRAINT) => return AuthError::DuplicateIdentity(IdentityField::Email),
                Some(USERNAME_CONSTRAINT) => {
                    return AuthError::DuplicateIdentity(IdentityField::Username);
                }
                _ => {}
            }
        }
        if db.is_foreign_key_violation() {
            return AuthError::unknown_reference();
        }
    }
    AuthError::Database(err)
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    email: String,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    is_active: bool,
    country_id: Option<i64>,
    company_id: Option<i64>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let password = PasswordDigest::from_phc(self.password_hash)
            .map_err(|_| AuthError::Internal(format!("account {} has a corrupt password hash", self.id)))?;
        let role = self
            .role
            .parse::<Role>()
            .map_err(|_| AuthError::Internal(format!("account {} has unknown role {}", self.id, self.role)))?;

        Ok(Account {
            id: AccountId::new(self.id),
            email: Email::from_db(self.email),
            username: Username::from_db(self.username),
            password,
            first_name: PersonName::from_db(self.first_name),
            last_name: PersonName::from_db(self.last_name),
            role,
            is_active: self.is_active,
            country_id: self.country_id.map(CountryId::new),
            company_id: self.company_id.map(CompanyId::new),
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
