//! Tracker Router

use auth::{AccountRepository, AuthAppState, authenticated};
use axum::{
    Router,
    routing::{get, post},
};

use crate::domain::repository::TrackerStore;
use crate::presentation::handlers::{self, TrackerAppState};

/// Reference data and daily task routes, all behind bearer authentication.
/// Mounted at the API root.
pub fn tracker_router<S, R>(state: TrackerAppState<S>, auth: AuthAppState<R>) -> Router
where
    S: TrackerStore,
    R: AccountRepository + Send + Sync + 'static,
{
    let routes = Router::new()
        .route(
            "/continents",
            get(handlers::list_continents::<S>).post(handlers::create_continent::<S>),
        )
        .route(
            "/continents/{id}",
            get(handlers::get_continent::<S>)
                .put(handlers::update_continent::<S>)
                .delete(handlers::delete_continent::<S>),
        )
        .route(
            "/continents/code/{code}",
            get(handlers::get_continent_by_code::<S>),
        )
        .route(
            "/countries",
            get(handlers::list_countries::<S>).post(handlers::create_country::<S>),
        )
        .route(
            "/countries/{id}",
            get(handlers::get_country::<S>)
                .put(handlers::update_country::<S>)
                .delete(handlers::delete_country::<S>),
        )
        .route("/countries/code/{code}", get(handlers::get_country_by_code::<S>))
        .route(
            "/countries/continent/{continent_id}",
            get(handlers::list_countries_by_continent::<S>),
        )
        .route(
            "/companies",
            get(handlers::list_companies::<S>).post(handlers::create_company::<S>),
        )
        .route(
            "/companies/{id}",
            get(handlers::get_company::<S>)
                .put(handlers::update_company::<S>)
                .delete(handlers::delete_company::<S>),
        )
        .route("/companies/code/{code}", get(handlers::get_company_by_code::<S>))
        .route(
            "/companies/country/{country_id}",
            get(handlers::list_companies_by_country::<S>),
        )
        .route(
            "/companies/industry/{industry}",
            get(handlers::list_companies_by_industry::<S>),
        )
        .route("/dailytask", post(handlers::create_task::<S>))
        .route(
            "/dailytask/{key}",
            get(handlers::tasks_for_date::<S>)
                .put(handlers::update_task::<S>)
                .delete(handlers::delete_task::<S>),
        );

    authenticated(routes, auth).with_state(state)
}
