use derive_more::Display;
use kernel::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Coarse-grained authorization label carried by every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display("admin")]
    Admin,
    #[default]
    #[display("user")]
    User,
    #[display("manager")]
    Manager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::User, Role::Manager];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Manager => "manager",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Anything above the default self-service role.
    #[inline]
    pub const fn is_elevated(&self) -> bool {
        !matches!(self, Role::User)
    }

    pub fn is_any_of(&self, roles: &[Role]) -> bool {
        roles.contains(self)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(code: &str) -> AppResult<Self> {
        Role::ALL
            .into_iter()
            .find(|r| r.code() == code.trim())
            .ok_or_else(|| AppError::bad_request("Role must be one of: admin, user, manager"))
    }
}
