use kernel::id::AccountId;
use serde::Serialize;

use crate::domain::value_object::{Email, Role, Username};

/// The caller behind a validated bearer token.
///
/// Inserted into request extensions by `require_auth` and read by handlers
/// for role and ownership decisions. Lives only for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub id: AccountId,
    pub email: Email,
    pub username: Username,
    pub role: Role,
}

impl AuthenticatedIdentity {
    pub fn owns(&self, owner: AccountId) -> bool {
        self.id == owner
    }
}
