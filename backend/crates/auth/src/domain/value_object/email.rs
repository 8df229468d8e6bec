//! Account email.
//!
//! Only the shape is checked. Comparison is exact, so `A@x.com` and
//! `a@x.com` belong to different accounts.

use derive_more::Display;
use kernel::{AppError, AppResult};
use serde::Serialize;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 254;

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Trims surrounding whitespace; case is preserved.
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let email = raw.as_ref().trim();
        if email.is_empty() {
            return Err(AppError::bad_request("Email is required"));
        }
        if !(MIN_LEN..=MAX_LEN).contains(&email.chars().count()) {
            return Err(AppError::bad_request(format!(
                "Email must be between {MIN_LEN} and {MAX_LEN} characters"
            )));
        }
        match email.split_once('@') {
            Some((local, domain)) if local_ok(local) && domain_ok(domain) => {
                Ok(Self(email.to_owned()))
            }
            _ => Err(AppError::bad_request("Invalid email format")),
        }
    }

    /// Stored values were validated on the way in.
    pub fn from_db(email: String) -> Self {
        Self(email)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn local_ok(local: &str) -> bool {
    !local.is_empty() && !local.contains(char::is_whitespace)
}

/// Dotted hostname: labels of letters, digits and `-`, none empty, none
/// starting or ending with `-`.
fn domain_ok(domain: &str) -> bool {
    domain.contains('.')
        && domain.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}
