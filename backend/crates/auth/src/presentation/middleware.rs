//! Auth Middleware
//!
//! `require_auth` turns a bearer token into an [`AuthenticatedIdentity`] in
//! the request extensions; `require_roles` gates a route on that identity.
//! Handlers read the identity back through its extractor.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::{self, Next};
use axum::response::Response;
use platform::bearer::{BearerError, bearer_token};
use platform::client::extract_client_ip;
use platform::password::CredentialHasher;

use crate::application::access::ensure_role;
use crate::application::config::AuthConfig;
use crate::application::token_service::TokenService;
use crate::application::{AccountAdminUseCase, AccountService};
use crate::domain::entity::AuthenticatedIdentity;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::Role;
use crate::error::{AuthError, AuthResult};

/// Shared state for auth handlers and middleware.
pub struct AuthAppState<R> {
    pub repo: Arc<R>,
    pub tokens: Arc<TokenService>,
    pub hasher: CredentialHasher,
    pub config: Arc<AuthConfig>,
}

// Manual impl: `R` itself need not be `Clone`.
impl<R> Clone for AuthAppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            tokens: Arc::clone(&self.tokens),
            hasher: self.hasher.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> AuthAppState<R>
where
    R: AccountRepository,
{
    pub fn new(repo: R, config: AuthConfig) -> AuthResult<Self> {
        let tokens = TokenService::new(&config)?;
        let hasher = CredentialHasher::new(config.password_pepper.clone());
        Ok(Self {
            repo: Arc::new(repo),
            tokens: Arc::new(tokens),
            hasher,
            config: Arc::new(config),
        })
    }

    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn accounts(&self) -> AccountService<R> {
        AccountService::new(
            Arc::clone(&self.repo),
            Arc::clone(&self.tokens),
            self.hasher.clone(),
        )
    }

    pub fn admin(&self) -> AccountAdminUseCase<R> {
        AccountAdminUseCase::new(Arc::clone(&self.repo))
    }
}

/// Reject the request unless it carries a valid token for a live account.
pub async fn require_auth<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AccountRepository + Send + Sync + 'static,
{
    // Owned copy: the request body is not `Sync`, so no borrow of it may
    // live across the store lookup.
    let token = bearer_token(req.headers())
        .map_err(|e| match e {
            BearerError::Missing => AuthError::MissingToken,
            BearerError::Malformed => AuthError::MalformedHeader,
        })?
        .to_owned();

    let account = state.tokens.resolve_account(state.repo.as_ref(), &token).await?;

    tracing::debug!(account_id = %account.id, role = %account.role, "Request authenticated");
    req.extensions_mut().insert(account.identity());

    Ok(next.run(req).await)
}

/// Roles permitted on a route group.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    allowed: Arc<[Role]>,
}

impl RoleGuard {
    pub fn new(allowed: &[Role]) -> Self {
        Self {
            allowed: Arc::from(allowed),
        }
    }

    pub fn admin() -> Self {
        Self::new(&[Role::Admin])
    }
}

/// Must run inside `require_auth`.
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = req
        .extensions()
        .get::<AuthenticatedIdentity>()
        .ok_or(AuthError::MissingToken)?;
    ensure_role(identity, &guard.allowed)?;

    Ok(next.run(req).await)
}

/// Wrap every route of `router` in [`require_auth`].
pub fn authenticated<R, S>(router: Router<S>, state: AuthAppState<R>) -> Router<S>
where
    R: AccountRepository + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(state, require_auth::<R>))
}

/// Authentication plus a role gate. The role check runs second.
pub fn restricted<R, S>(router: Router<S>, state: AuthAppState<R>, guard: RoleGuard) -> Router<S>
where
    R: AccountRepository + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    authenticated(
        router.route_layer(middleware::from_fn_with_state(guard, require_roles)),
        state,
    )
}

impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Best-effort client address: forwarding headers first, then the socket peer.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        Ok(ClientAddr(extract_client_ip(&parts.headers, peer)))
    }
}
