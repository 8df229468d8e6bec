//! Password hashing and verification.
//!
//! - Argon2id in PHC string format, random 128-bit salt per hash
//! - NFKC normalisation before length checks and hashing
//! - Plaintext kept in a zeroize-on-drop buffer
//! - Optional application pepper appended before hashing
//!
//! - Decoy verification for logins whose account does not exist
//!
//! Hashing is deliberately slow. Async callers should go through
//! [`CredentialHasher::hash_blocking`] / [`CredentialHasher::verify_blocking`],
//! which move the work onto tokio's blocking pool.

use std::fmt;
use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use rand::rngs::OsRng;
use thiserror::Error;
use tokio::sync::OnceCell;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::random_bytes;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters")]
    TooShort { min: usize },

    #[error("Password must be at most {max} characters")]
    TooLong { max: usize },

    #[error("Password cannot be blank")]
    Blank,

    #[error("Password contains control characters")]
    ControlCharacter,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("invalid argon2 parameters: {0}")]
    Params(String),

    #[error("stored hash is not a valid PHC string")]
    InvalidFormat,

    #[error("hashing task aborted: {0}")]
    Join(String),
}

/// Plaintext password. Wiped on drop, redacted in `Debug`, never `Clone`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PlainPassword(String);

impl PlainPassword {
    /// Normalise and check a password that is about to be stored.
    pub fn new(raw: &str) -> Result<Self, PasswordPolicyError> {
        let normalized = Self::candidate(raw);

        if normalized.0.trim().is_empty() {
            return Err(PasswordPolicyError::Blank);
        }

        let chars = normalized.0.chars().count();
        if chars < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if chars > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
            });
        }

        if normalized.0.chars().any(|c| c.is_control()) {
            return Err(PasswordPolicyError::ControlCharacter);
        }

        Ok(normalized)
    }

    /// Normalise a login attempt without applying the storage policy.
    ///
    /// A candidate that could never have been stored simply fails to verify.
    pub fn candidate(raw: &str) -> Self {
        Self(raw.nfkc().collect())
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(self.0.as_bytes().to_vec());
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        bytes
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword([REDACTED])")
    }
}

/// Stored credential: an Argon2 PHC string.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Accept a PHC string loaded from storage.
    pub fn from_phc(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let s = s.into();
        PasswordHash::new(&s).map_err(|_| PasswordHashError::InvalidFormat)?;
        Ok(Self(s))
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest([HASH])")
    }
}

/// Argon2id hasher with fixed cost parameters and an optional pepper.
///
/// Cheap to clone; the pepper and decoy digest are shared.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
    pepper: Option<Arc<Zeroizing<Vec<u8>>>>,
    decoy: Arc<OnceCell<PasswordDigest>>,
}

impl CredentialHasher {
    /// OWASP baseline: m=19 MiB, t=2, p=1.
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self {
            params: Params::default(),
            pepper: pepper.map(|p| Arc::new(Zeroizing::new(p))),
            decoy: Arc::default(),
        }
    }

    /// Custom cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        lanes: u32,
        pepper: Option<Vec<u8>>,
    ) -> Result<Self, PasswordHashError> {
        let params = Params::new(memory_kib, iterations, lanes, None)
            .map_err(|e| PasswordHashError::Params(e.to_string()))?;
        Ok(Self {
            params,
            pepper: pepper.map(|p| Arc::new(Zeroizing::new(p))),
            decoy: Arc::default(),
        })
    }

    /// Minimum-cost parameters for test suites.
    pub fn insecure_fast() -> Self {
        Self {
            params: Params::new(Params::MIN_M_COST, 1, 1, None).unwrap_or_default(),
            pepper: None,
            decoy: Arc::default(),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn pepper(&self) -> Option<&[u8]> {
        self.pepper.as_deref().map(|p| p.as_slice())
    }

    pub fn hash(&self, password: &PlainPassword) -> Result<PasswordDigest, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let input = password.peppered(self.pepper());
        let hash = self
            .argon2()
            .hash_password(&input, &salt)
            .map_err(|e| PasswordHashError::Hashing(e.to_string()))?;
        Ok(PasswordDigest(hash.to_string()))
    }

    /// Constant-time check of `candidate` against `digest`.
    pub fn verify(&self, digest: &PasswordDigest, candidate: &PlainPassword) -> bool {
        let Ok(parsed) = PasswordHash::new(&digest.0) else {
            return false;
        };
        let input = candidate.peppered(self.pepper());
        self.argon2().verify_password(&input, &parsed).is_ok()
    }

    pub async fn hash_blocking(
        &self,
        password: PlainPassword,
    ) -> Result<PasswordDigest, PasswordHashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordHashError::Join(e.to_string()))?
    }

    pub async fn verify_blocking(
        &self,
        digest: PasswordDigest,
        candidate: PlainPassword,
    ) -> Result<bool, PasswordHashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &candidate))
            .await
            .map_err(|e| PasswordHashError::Join(e.to_string()))
    }

    /// Verify `candidate` against a digest of random bytes and answer `false`.
    ///
    /// Lets a lookup miss cost the same as a wrong password. The decoy is
    /// hashed on first use and shared by every clone of this hasher.
    pub async fn verify_decoy_blocking(
        &self,
        candidate: PlainPassword,
    ) -> Result<bool, PasswordHashError> {
        let digest = self
            .decoy
            .get_or_try_init(|| async {
                let filler = STANDARD_NO_PAD.encode(random_bytes(24));
                self.hash_blocking(PlainPassword::candidate(&filler)).await
            })
            .await?
            .clone();
        self.verify_blocking(digest, candidate).await?;
        Ok(false)
    }

    /// The decoy digest, once a lookup miss has produced it.
    pub fn decoy(&self) -> Option<&PasswordDigest> {
        self.decoy.get()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("peppered", &self.pepper.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_rejects_short() {
        assert_eq!(
            PlainPassword::new("short").unwrap_err(),
            PasswordPolicyError::TooShort { min: 8 }
        );
    }

    #[test]
    fn test_policy_rejects_long() {
        let long = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(
            PlainPassword::new(&long),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_policy_rejects_blank() {
        assert_eq!(
            PlainPassword::new("          ").unwrap_err(),
            PasswordPolicyError::Blank
        );
    }

    #[test]
    fn test_policy_rejects_control_characters() {
        assert_eq!(
            PlainPassword::new("abc\u{0007}defgh").unwrap_err(),
            PasswordPolicyError::ControlCharacter
        );
    }

    #[test]
    fn test_policy_counts_code_points() {
        assert!(PlainPassword::new("パスワード安全です").is_ok());
    }

    #[test]
    fn test_hash_never_equals_plaintext() {
        let hasher = CredentialHasher::insecure_fast();
        let password = PlainPassword::new("longenough1").unwrap();
        let digest = hasher.hash(&password).unwrap();
        assert_ne!(digest.as_phc(), "longenough1");
        assert!(digest.as_phc().starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = CredentialHasher::insecure_fast();
        let digest = hasher.hash(&PlainPassword::new("longenough1").unwrap()).unwrap();

        assert!(hasher.verify(&digest, &PlainPassword::candidate("longenough1")));
        assert!(!hasher.verify(&digest, &PlainPassword::candidate("wrong")));
    }

    #[test]
    fn test_same_password_different_salt() {
        let hasher = CredentialHasher::insecure_fast();
        let a = hasher.hash(&PlainPassword::new("longenough1").unwrap()).unwrap();
        let b = hasher.hash(&PlainPassword::new("longenough1").unwrap()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_pepper_must_match() {
        let peppered =
            CredentialHasher::with_params(Params::MIN_M_COST, 1, 1, Some(b"pepper".to_vec()))
                .unwrap();
        let plain = CredentialHasher::insecure_fast();
        let digest = peppered
            .hash(&PlainPassword::new("longenough1").unwrap())
            .unwrap();

        assert!(peppered.verify(&digest, &PlainPassword::candidate("longenough1")));
        assert!(!plain.verify(&digest, &PlainPassword::candidate("longenough1")));
    }

    #[test]
    fn test_from_phc_rejects_garbage() {
        assert!(PasswordDigest::from_phc("not a hash").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let password = PlainPassword::candidate("hunter22hunter");
        assert!(!format!("{password:?}").contains("hunter"));
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = CredentialHasher::insecure_fast();
        let digest = hasher
            .hash_blocking(PlainPassword::new("longenough1").unwrap())
            .await
            .unwrap();
        assert!(
            hasher
                .verify_blocking(digest, PlainPassword::candidate("longenough1"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_decoy_never_matches_and_is_shared() {
        let hasher = CredentialHasher::insecure_fast();
        let clone = hasher.clone();
        assert!(hasher.decoy().is_none());

        let matched = clone
            .verify_decoy_blocking(PlainPassword::candidate("longenough1"))
            .await
            .unwrap();
        assert!(!matched);
        assert!(hasher.decoy().is_some());

        let first = hasher.decoy().cloned();
        hasher
            .verify_decoy_blocking(PlainPassword::candidate(""))
            .await
            .unwrap();
        assert_eq!(hasher.decoy().cloned(), first);
    }
}
