//! Application Configuration
//!
//! Built once at startup by the binary and shared behind an `Arc`.

use std::fmt;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::error::{AuthError, AuthResult};

pub const MIN_SECRET_LENGTH: usize = 32;
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_ISSUER: &str = "tracker-api";
pub const DEFAULT_AUDIENCE: &str = "tracker-clients";

/// Whether administrators may mutate resources owned by other accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnershipPolicy {
    pub admin_bypass: bool,
}

impl OwnershipPolicy {
    pub const STRICT: Self = Self {
        admin_bypass: false,
    };
}

#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC signing secret, process-wide and immutable after startup.
    jwt_secret: Zeroizing<Vec<u8>>,
    pub token_ttl: Duration,
    pub issuer: String,
    pub audience: String,
    pub ownership: OwnershipPolicy,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> AuthResult<Self> {
        let jwt_secret = Zeroizing::new(jwt_secret.into());
        if jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(AuthError::Configuration(format!(
                "JWT secret must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }
        Ok(Self {
            jwt_secret,
            token_ttl: DEFAULT_TOKEN_TTL,
            issuer: DEFAULT_ISSUER.to_owned(),
            audience: DEFAULT_AUDIENCE.to_owned(),
            ownership: OwnershipPolicy::STRICT,
            password_pepper: None,
        })
    }

    /// Random secret; tokens do not survive a restart.
    pub fn with_random_secret() -> Self {
        Self {
            jwt_secret: Zeroizing::new(platform::crypto::random_bytes(MIN_SECRET_LENGTH * 2)),
            token_ttl: DEFAULT_TOKEN_TTL,
            issuer: DEFAULT_ISSUER.to_owned(),
            audience: DEFAULT_AUDIENCE.to_owned(),
            ownership: OwnershipPolicy::STRICT,
            password_pepper: None,
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self.audience = audience.into();
        self
    }

    pub fn with_ownership(mut self, ownership: OwnershipPolicy) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn with_pepper(mut self, pepper: Option<Vec<u8>>) -> Self {
        self.password_pepper = pepper;
        self
    }

    pub fn jwt_secret(&self) -> &[u8] {
        &self.jwt_secret
    }

    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ownership", &self.ownership)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
