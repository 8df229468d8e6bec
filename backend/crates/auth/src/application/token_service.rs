//! Token Service
//!
//! Mints and verifies HMAC-signed bearer tokens. Stateless: a token is
//! valid while its signature checks out and `exp` has not passed.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::AccountId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::{Account, AuthenticatedIdentity};
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::Role;
use crate::error::{AuthError, AuthResult, TokenRejection};

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claim set carried inside every token.
///
/// `user_id` is kept as a raw JSON value: other issuers and some client
/// libraries emit it as a float, so it is narrowed in [`TokenService::extract_identity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    pub iss: String,
    pub aud: String,
    /// Unique per token, so two tokens minted in the same second still differ.
    #[serde(default)]
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let ttl = chrono::Duration::from_std(config.token_ttl)
            .map_err(|e| AuthError::Configuration(format!("token lifetime out of range: {e}")))?;
        if ttl <= chrono::Duration::zero() {
            return Err(AuthError::Configuration("token lifetime must be positive".into()));
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret()),
            decoding: DecodingKey::from_secret(config.jwt_secret()),
            validation,
            ttl,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// Sign a fresh token for `identity`. Touches no storage.
    pub fn issue(&self, identity: &AuthenticatedIdentity) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            user_id: Some(Value::from(identity.id.value())),
            email: identity.email.as_str().to_owned(),
            username: identity.username.as_str().to_owned(),
            role: Some(identity.role.code().to_owned()),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, expires_at })
    }

    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Verify signature, algorithm family, issuer, audience and expiry.
    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    JwtErrorKind::ExpiredSignature => TokenRejection::Expired,
                    JwtErrorKind::InvalidSignature => TokenRejection::BadSignature,
                    JwtErrorKind::InvalidAlgorithm
                    | JwtErrorKind::InvalidAlgorithmName
                    | JwtErrorKind::MissingAlgorithm => TokenRejection::WrongAlgorithm,
                    JwtErrorKind::InvalidIssuer | JwtErrorKind::InvalidAudience => {
                        TokenRejection::WrongIssuerOrAudience
                    }
                    JwtErrorKind::MissingRequiredClaim(claim) => {
                        TokenRejection::ClaimMissing(claim.clone().into())
                    }
                    _ => TokenRejection::Malformed,
                };
                AuthError::InvalidToken(reason)
            })
    }

    /// Narrow the `user_id` claim to a positive integer id.
    pub fn extract_identity(claims: &Claims) -> AuthResult<AccountId> {
        claims
            .user_id
            .as_ref()
            .and_then(narrow_account_id)
            .map(AccountId::new)
            .ok_or(AuthError::InvalidToken(TokenRejection::ClaimMissing("user_id".into())))
    }

    pub fn extract_role(claims: &Claims) -> AuthResult<Role> {
        claims
            .role
            .as_deref()
            .and_then(|code| code.parse::<Role>().ok())
            .ok_or(AuthError::InvalidToken(TokenRejection::ClaimMissing("role".into())))
    }

    /// Token to live account. The only entry point the middleware uses.
    ///
    /// The account is re-read so deactivation and role changes take effect
    /// on the next request, without waiting for the token to expire.
    pub async fn resolve_account<R>(&self, repo: &R, token: &str) -> AuthResult<Account>
    where
        R: AccountRepository,
    {
        let claims = self.validate(token)?;
        let id = Self::extract_identity(&claims)?;

        let account = repo
            .find_by_id(id)
            .await?
            .ok_or(AuthError::InvalidToken(TokenRejection::UnknownAccount))?;

        if !account.can_authenticate() {
            return Err(AuthError::InvalidToken(TokenRejection::InactiveAccount));
        }
        Ok(account)
    }
}

/// Checked conversion of a JSON number to an id. Fractions, non-positive
/// values, overflow and non-numbers all fail.
fn narrow_account_id(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return (i > 0).then_some(i);
    }
    let f = n.as_f64()?;
    if f.fract() != 0.0 || f <= 0.0 || f >= i64::MAX as f64 {
        return None;
    }
    Some(f as i64)
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryAccountRepository;
    use crate::tests::fixtures;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn service() -> TokenService {
        TokenService::new(&fixtures::config()).unwrap()
    }

    fn rejection(err: AuthError) -> TokenRejection {
        match err {
            AuthError::InvalidToken(reason) => reason,
            other => panic!("expected InvalidToken, got {other:?}"),
        }
    }

    fn claims_for(service: &TokenService, user_id: Value, exp: i64) -> Claims {
        Claims {
            user_id: Some(user_id),
            email: "a@x.com".into(),
            username: "alice".into(),
            role: Some("user".into()),
            exp,
            iat: Utc::now().timestamp(),
            iss: service.issuer.clone(),
            aud: service.audience.clone(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    #[test]
    fn test_issue_then_validate() {
        let tokens = service();
        let identity = fixtures::identity(7, Role::Manager);
        let issued = tokens.issue(&identity).unwrap();

        assert_eq!(issued.token.split('.').count(), 3);
        let claims = tokens.validate(&issued.token).unwrap();
        assert_eq!(TokenService::extract_identity(&claims).unwrap(), AccountId::new(7));
        assert_eq!(TokenService::extract_role(&claims).unwrap(), Role::Manager);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_successive_tokens_differ_but_share_subject() {
        let tokens = service();
        let identity = fixtures::identity(3, Role::User);
        let first = tokens.issue(&identity).unwrap();
        let second = tokens.issue(&identity).unwrap();
        assert_ne!(first.token, second.token);

        let a = tokens.validate(&first.token).unwrap();
        let b = tokens.validate(&second.token).unwrap();
        assert_eq!(
            TokenService::extract_identity(&a).unwrap(),
            TokenService::extract_identity(&b).unwrap()
        );
    }

    #[test]
    fn test_expired_token_rejected_despite_valid_signature() {
        let tokens = service();
        let past = Utc::now().timestamp() - 60;
        let token = tokens.sign(&claims_for(&tokens, json!(1), past)).unwrap();
        assert_eq!(
            rejection(tokens.validate(&token).unwrap_err()),
            TokenRejection::Expired
        );
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let ours = service();
        let theirs = TokenService::new(&fixtures::config()).unwrap();
        let token = theirs.issue(&fixtures::identity(1, Role::Admin)).unwrap().token;
        assert_eq!(
            rejection(ours.validate(&token).unwrap_err()),
            TokenRejection::BadSignature
        );
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let tokens = service();
        let token = tokens.issue(&fixtures::identity(1, Role::User)).unwrap().token;
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims_for(&tokens, json!(1), i64::MAX / 2)).unwrap(),
        );
        parts[1] = &forged;
        let forged_token = parts.join(".");
        assert!(tokens.validate(&forged_token).is_err());
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        let tokens = service();
        let token = tokens.issue(&fixtures::identity(1, Role::User)).unwrap().token;
        let (_, rest) = token.split_once('.').unwrap();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let confused = format!("{header}.{rest}");
        assert_eq!(
            rejection(tokens.validate(&confused).unwrap_err()),
            TokenRejection::WrongAlgorithm
        );
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let tokens = service();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims_for(&tokens, json!(1), i64::MAX / 2)).unwrap(),
        );
        assert!(tokens.validate(&format!("{header}.{body}.")).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = service();
        for token in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(matches!(
                tokens.validate(token),
                Err(AuthError::InvalidToken(_))
            ));
        }
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let ours = service();
        let other = TokenService::new(
            &AuthConfig::new(vec![1u8; 32])
                .unwrap()
                .with_issuer("tracker-api", "someone-else"),
        )
        .unwrap();
        let ours_same_key =
            TokenService::new(&AuthConfig::new(vec![1u8; 32]).unwrap()).unwrap();
        let token = other.issue(&fixtures::identity(1, Role::User)).unwrap().token;
        assert_eq!(
            rejection(ours_same_key.validate(&token).unwrap_err()),
            TokenRejection::WrongIssuerOrAudience
        );
        assert!(ours.validate(&token).is_err());
    }

    #[test]
    fn test_extract_identity_narrows_floats() {
        let tokens = service();
        let exp = Utc::now().timestamp() + 60;
        let from = |v: Value| TokenService::extract_identity(&claims_for(&tokens, v, exp));

        assert_eq!(from(json!(42)).unwrap(), AccountId::new(42));
        assert_eq!(from(json!(42.0)).unwrap(), AccountId::new(42));
        assert!(from(json!(42.5)).is_err());
        assert!(from(json!(-1)).is_err());
        assert!(from(json!(0)).is_err());
        assert!(from(json!(1e20)).is_err());
        assert!(from(json!(u64::MAX)).is_err());
        assert!(from(json!("42")).is_err());
        assert!(from(Value::Null).is_err());
    }

    #[test]
    fn test_float_user_id_survives_round_trip() {
        let tokens = service();
        let exp = Utc::now().timestamp() + 60;
        let token = tokens.sign(&claims_for(&tokens, json!(9.0), exp)).unwrap();
        let claims = tokens.validate(&token).unwrap();
        assert_eq!(TokenService::extract_identity(&claims).unwrap(), AccountId::new(9));
    }

    #[test]
    fn test_missing_claims() {
        let tokens = service();
        let mut claims = claims_for(&tokens, json!(1), Utc::now().timestamp() + 60);
        claims.user_id = None;
        claims.role = None;
        assert_eq!(
            rejection(TokenService::extract_identity(&claims).unwrap_err()),
            TokenRejection::ClaimMissing("user_id".into())
        );
        assert_eq!(
            rejection(TokenService::extract_role(&claims).unwrap_err()),
            TokenRejection::ClaimMissing("role".into())
        );
    }

    #[tokio::test]
    async fn test_resolve_account() {
        let tokens = service();
        let repo = MemoryAccountRepository::new();
        let account = fixtures::seed_account(&repo, "a@x.com", "alice", Role::User).await;

        let token = tokens.issue(&account.identity()).unwrap().token;
        let resolved = tokens.resolve_account(&repo, &token).await.unwrap();
        assert_eq!(resolved.id, account.id);
    }

    #[tokio::test]
    async fn test_resolve_account_unknown_or_inactive() {
        let tokens = service();
        let repo = MemoryAccountRepository::new();

        let ghost = tokens.issue(&fixtures::identity(999, Role::User)).unwrap().token;
        assert_eq!(
            rejection(tokens.resolve_account(&repo, &ghost).await.unwrap_err()),
            TokenRejection::UnknownAccount
        );

        let mut account = fixtures::seed_account(&repo, "b@x.com", "bob", Role::User).await;
        let token = tokens.issue(&account.identity()).unwrap().token;
        account.set_active(false);
        repo.update(&account).await.unwrap();
        assert_eq!(
            rejection(tokens.resolve_account(&repo, &token).await.unwrap_err()),
            TokenRejection::InactiveAccount
        );
    }
}
