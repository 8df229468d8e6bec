//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::application::{
    AccountPage, AdminAccountUpdate, IssuedToken, LoginInput, ProfileUpdate, RegisterInput,
};
use crate::domain::entity::Account;

// ============================================================================
// Registration / Login
// ============================================================================

/// Used by both `POST /auth/register` and `POST /admin/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub country_id: Option<i64>,
    #[serde(default)]
    pub company_id: Option<i64>,
}

impl From<RegisterRequest> for RegisterInput {
    fn from(req: RegisterRequest) -> Self {
        RegisterInput {
            email: req.email,
            username: req.username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            role: req.role,
            country_id: req.country_id,
            company_id: req.company_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<LoginRequest> for LoginInput {
    fn from(req: LoginRequest) -> Self {
        LoginInput {
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AccountResponse,
}

impl AuthResponse {
    pub fn new(token: IssuedToken, account: &Account) -> Self {
        Self {
            token: token.token,
            expires_at: token.expires_at,
            user: AccountResponse::from(account),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            token: token.token,
            expires_at: token.expires_at,
        }
    }
}

// ============================================================================
// Account
// ============================================================================

/// Outward view of an account. The password digest never leaves the crate.
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.value(),
            email: account.email.as_str().to_owned(),
            username: account.username.as_str().to_owned(),
            first_name: account.first_name.as_str().to_owned(),
            last_name: account.last_name.as_str().to_owned(),
            role: account.role.code().to_owned(),
            is_active: account.is_active,
            country_id: account.country_id.map(|id| id.value()),
            company_id: account.company_id.map(|id| id.value()),
            last_login_at: account.last_login_at,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Absent keeps the stored value, `null` clears it.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub country_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub company_id: Option<Option<i64>>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            first_name: req.first_name,
            last_name: req.last_name,
            country_id: req.country_id,
            company_id: req.company_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ============================================================================
// Administration
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAccountsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountListResponse {
    pub users: Vec<AccountResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl From<AccountPage> for AccountListResponse {
    fn from(page: AccountPage) -> Self {
        Self {
            users: page.accounts.iter().map(AccountResponse::from).collect(),
            total: page.total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub country_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub company_id: Option<Option<i64>>,
}

impl From<AdminUpdateRequest> for AdminAccountUpdate {
    fn from(req: AdminUpdateRequest) -> Self {
        AdminAccountUpdate {
            first_name: req.first_name,
            last_name: req.last_name,
            role: req.role,
            is_active: req.is_active,
            country_id: req.country_id,
            company_id: req.company_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_and_null_organisations_differ() {
        let absent: UpdateProfileRequest = serde_json::from_value(json!({"first_name": "Al"})).unwrap();
        assert_eq!(absent.country_id, None);
        assert_eq!(absent.company_id, None);

        let cleared: UpdateProfileRequest =
            serde_json::from_value(json!({"country_id": null, "company_id": 4})).unwrap();
        assert_eq!(cleared.country_id, Some(None));
        assert_eq!(cleared.company_id, Some(Some(4)));

        let admin: AdminUpdateRequest = serde_json::from_value(json!({"company_id": null})).unwrap();
        assert_eq!(admin.company_id, Some(None));
        assert_eq!(admin.country_id, None);
    }
}
