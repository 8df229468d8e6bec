//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use kernel::extract::{JsonBody, PathParam, QueryParams};
use kernel::id::AccountId;

use crate::application::Registrar;
use crate::domain::entity::AuthenticatedIdentity;
use crate::domain::repository::AccountRepository;
use crate::error::AuthResult;
use crate::presentation::dto::{
    AccountListResponse, AccountResponse, AdminUpdateRequest, AuthResponse,
    ChangePasswordRequest, ListAccountsQuery, LoginRequest, RegisterRequest, TokenResponse,
    UpdateProfileRequest,
};
use crate::presentation::middleware::{AuthAppState, ClientAddr};

// ============================================================================
// Registration / Login
// ============================================================================

/// POST /auth/register
pub async fn register<R>(
    State(state): State<AuthAppState<R>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let service = state.accounts();
    let account = service.register(req.into(), Registrar::SelfService).await?;
    let token = state.tokens.issue(&account.identity())?;

    Ok((StatusCode::CREATED, Json(AuthResponse::new(token, &account))))
}

/// POST /auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    ClientAddr(client_ip): ClientAddr,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AuthResult<Json<AuthResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let output = state.accounts().login(req.into(), client_ip).await?;
    Ok(Json(AuthResponse::new(output.token, &output.account)))
}

// ============================================================================
// Self-service
// ============================================================================

/// GET /auth/profile
pub async fn profile<R>(
    State(state): State<AuthAppState<R>>,
    identity: AuthenticatedIdentity,
) -> AuthResult<Json<AccountResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let account = state.accounts().profile(&identity).await?;
    Ok(Json(AccountResponse::from(&account)))
}

/// PUT /auth/profile
pub async fn update_profile<R>(
    State(state): State<AuthAppState<R>>,
    identity: AuthenticatedIdentity,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> AuthResult<Json<AccountResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let account = state.accounts().update_profile(&identity, req.into()).await?;
    Ok(Json(AccountResponse::from(&account)))
}

/// PUT /auth/password
pub async fn change_password<R>(
    State(state): State<AuthAppState<R>>,
    identity: AuthenticatedIdentity,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + Send + Sync + 'static,
{
    state
        .accounts()
        .change_password(&identity, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/refresh
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    identity: AuthenticatedIdentity,
) -> AuthResult<Json<TokenResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let token = state.accounts().refresh_token(&identity)?;
    Ok(Json(token.into()))
}

// ============================================================================
// Administration
// ============================================================================

/// GET /admin/users
pub async fn list_accounts<R>(
    State(state): State<AuthAppState<R>>,
    QueryParams(query): QueryParams<ListAccountsQuery>,
) -> AuthResult<Json<AccountListResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let page = state.admin().list(query.limit, query.offset).await?;
    Ok(Json(page.into()))
}

/// POST /admin/users
pub async fn create_account<R>(
    State(state): State<AuthAppState<R>>,
    identity: AuthenticatedIdentity,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<AccountResponse>)>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let account = state
        .accounts()
        .register(req.into(), Registrar::Administrator(&identity))
        .await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// GET /admin/users/{id}
pub async fn get_account<R>(
    State(state): State<AuthAppState<R>>,
    PathParam(id): PathParam<i64>,
) -> AuthResult<Json<AccountResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let account = state.admin().get(AccountId::new(id)).await?;
    Ok(Json(AccountResponse::from(&account)))
}

/// PUT /admin/users/{id}
pub async fn update_account<R>(
    State(state): State<AuthAppState<R>>,
    identity: AuthenticatedIdentity,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<AdminUpdateRequest>,
) -> AuthResult<Json<AccountResponse>>
where
    R: AccountRepository + Send + Sync + 'static,
{
    let account = state
        .admin()
        .update(&identity, AccountId::new(id), req.into())
        .await?;
    Ok(Json(AccountResponse::from(&account)))
}

/// DELETE /admin/users/{id}
pub async fn delete_account<R>(
    State(state): State<AuthAppState<R>>,
    identity: AuthenticatedIdentity,
    PathParam(id): PathParam<i64>,
) -> AuthResult<StatusCode>
where
    R: AccountRepository + Send + Sync + 'static,
{
    state.admin().delete(&identity, AccountId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
