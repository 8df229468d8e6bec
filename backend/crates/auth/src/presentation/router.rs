//! Auth Router

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::domain::repository::AccountRepository;
use crate::presentation::handlers;
use crate::presentation::middleware::{AuthAppState, RoleGuard, authenticated, restricted};

/// Routes mounted under `/auth`.
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: AccountRepository + Send + Sync + 'static,
{
    let protected = Router::new()
        .route(
            "/profile",
            get(handlers::profile::<R>).put(handlers::update_profile::<R>),
        )
        .route("/password", put(handlers::change_password::<R>))
        .route("/refresh", post(handlers::refresh::<R>));

    Router::new()
        .route("/register", post(handlers::register::<R>))
        .route("/login", post(handlers::login::<R>))
        .merge(authenticated(protected, state.clone()))
        .with_state(state)
}

/// Routes mounted under `/admin`. Administrators only.
pub fn admin_router<R>(state: AuthAppState<R>) -> Router
where
    R: AccountRepository + Send + Sync + 'static,
{
    let routes = Router::new()
        .route(
            "/users",
            get(handlers::list_accounts::<R>).post(handlers::create_account::<R>),
        )
        .route(
            "/users/{id}",
            get(handlers::get_account::<R>)
                .put(handlers::update_account::<R>)
                .delete(handlers::delete_account::<R>),
        );

    restricted(routes, state.clone(), RoleGuard::admin()).with_state(state)
}
