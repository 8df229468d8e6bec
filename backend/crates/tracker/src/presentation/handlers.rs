//! HTTP Handlers
//!
//! Every route runs behind `auth::authenticated`, so each handler that
//! needs the caller takes an [`AuthenticatedIdentity`] extractor.

use std::sync::Arc;

use auth::{AuthenticatedIdentity, OwnershipPolicy};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use kernel::extract::{JsonBody, PathParam};
use kernel::id::{CompanyId, ContinentId, CountryId, TaskId};

use crate::application::{DailyTaskService, ReferenceService, parse_task_date};
use crate::domain::entity::{Company, Continent, Country, DailyTask};
use crate::domain::repository::TrackerStore;
use crate::error::{TrackerError, TrackerResult};
use crate::presentation::dto::{CompanyRequest, ContinentRequest, CountryRequest, TaskRequest};

/// Shared state for tracker handlers.
pub struct TrackerAppState<S> {
    pub store: Arc<S>,
    pub ownership: OwnershipPolicy,
}

impl<S> Clone for TrackerAppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ownership: self.ownership,
        }
    }
}

impl<S> TrackerAppState<S>
where
    S: TrackerStore,
{
    pub fn new(store: S, ownership: OwnershipPolicy) -> Self {
        Self {
            store: Arc::new(store),
            ownership,
        }
    }

    pub fn reference(&self) -> ReferenceService<S> {
        ReferenceService::new(Arc::clone(&self.store))
    }

    pub fn tasks(&self) -> DailyTaskService<S> {
        DailyTaskService::new(Arc::clone(&self.store), self.ownership)
    }
}

// ============================================================================
// Continents
// ============================================================================

pub async fn create_continent<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    JsonBody(req): JsonBody<ContinentRequest>,
) -> TrackerResult<(StatusCode, Json<Continent>)> {
    let continent = state.reference().create_continent(req.into()).await?;
    Ok((StatusCode::CREATED, Json(continent)))
}

pub async fn list_continents<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
) -> TrackerResult<Json<Vec<Continent>>> {
    Ok(Json(state.reference().continents().await?))
}

pub async fn get_continent<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(id): PathParam<i64>,
) -> TrackerResult<Json<Continent>> {
    Ok(Json(state.reference().continent(ContinentId::new(id)).await?))
}

pub async fn get_continent_by_code<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(code): PathParam<String>,
) -> TrackerResult<Json<Continent>> {
    Ok(Json(state.reference().continent_by_code(&code).await?))
}

pub async fn update_continent<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<ContinentRequest>,
) -> TrackerResult<Json<Continent>> {
    let continent = state
        .reference()
        .update_continent(ContinentId::new(id), req.into())
        .await?;
    Ok(Json(continent))
}

pub async fn delete_continent<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(id): PathParam<i64>,
) -> TrackerResult<StatusCode> {
    state.reference().delete_continent(ContinentId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Countries
// ============================================================================

pub async fn create_country<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    JsonBody(req): JsonBody<CountryRequest>,
) -> TrackerResult<(StatusCode, Json<Country>)> {
    let country = state.reference().create_country(req.into()).await?;
    Ok((StatusCode::CREATED, Json(country)))
}

pub async fn list_countries<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
) -> TrackerResult<Json<Vec<Country>>> {
    Ok(Json(state.reference().countries().await?))
}

pub async fn get_country<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(id): PathParam<i64>,
) -> TrackerResult<Json<Country>> {
    Ok(Json(state.reference().country(CountryId::new(id)).await?))
}

pub async fn get_country_by_code<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(code): PathParam<String>,
) -> TrackerResult<Json<Country>> {
    Ok(Json(state.reference().country_by_code(&code).await?))
}

pub async fn list_countries_by_continent<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(continent_id): PathParam<i64>,
) -> TrackerResult<Json<Vec<Country>>> {
    let countries = state
        .reference()
        .countries_in(ContinentId::new(continent_id))
        .await?;
    Ok(Json(countries))
}

pub async fn update_country<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<CountryRequest>,
) -> TrackerResult<Json<Country>> {
    let country = state
        .reference()
        .update_country(CountryId::new(id), req.into())
        .await?;
    Ok(Json(country))
}

pub async fn delete_country<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(id): PathParam<i64>,
) -> TrackerResult<StatusCode> {
    state.reference().delete_country(CountryId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Companies
// ============================================================================

pub async fn create_company<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    JsonBody(req): JsonBody<CompanyRequest>,
) -> TrackerResult<(StatusCode, Json<Company>)> {
    let company = state.reference().create_company(req.into()).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn list_companies<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
) -> TrackerResult<Json<Vec<Company>>> {
    Ok(Json(state.reference().companies().await?))
}

pub async fn get_company<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(id): PathParam<i64>,
) -> TrackerResult<Json<Company>> {
    Ok(Json(state.reference().company(CompanyId::new(id)).await?))
}

pub async fn get_company_by_code<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(code): PathParam<String>,
) -> TrackerResult<Json<Company>> {
    Ok(Json(state.reference().company_by_code(&code).await?))
}

pub async fn list_companies_by_country<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(country_id): PathParam<i64>,
) -> TrackerResult<Json<Vec<Company>>> {
    let companies = state
        .reference()
        .companies_in(CountryId::new(country_id))
        .await?;
    Ok(Json(companies))
}

pub async fn list_companies_by_industry<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(industry): PathParam<String>,
) -> TrackerResult<Json<Vec<Company>>> {
    Ok(Json(state.reference().companies_by_industry(&industry).await?))
}

pub async fn update_company<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<CompanyRequest>,
) -> TrackerResult<Json<Company>> {
    let company = state
        .reference()
        .update_company(CompanyId::new(id), req.into())
        .await?;
    Ok(Json(company))
}

pub async fn delete_company<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    PathParam(id): PathParam<i64>,
) -> TrackerResult<StatusCode> {
    state.reference().delete_company(CompanyId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Daily tasks
// ============================================================================

/// `GET` reads the segment as a date, `PUT`/`DELETE` as a task id.
fn parse_task_id(raw: &str) -> TrackerResult<TaskId> {
    raw.trim()
        .parse::<i64>()
        .map(TaskId::new)
        .map_err(|_| TrackerError::validation("Invalid task ID"))
}

/// POST /dailytask
pub async fn create_task<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    identity: AuthenticatedIdentity,
    JsonBody(req): JsonBody<TaskRequest>,
) -> TrackerResult<(StatusCode, Json<DailyTask>)> {
    let task = state.tasks().create(&identity, req.into()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /dailytask/{date}
pub async fn tasks_for_date<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    identity: AuthenticatedIdentity,
    PathParam(date): PathParam<String>,
) -> TrackerResult<Json<Vec<DailyTask>>> {
    let date = parse_task_date(&date)?;
    Ok(Json(state.tasks().for_date(&identity, date).await?))
}

/// PUT /dailytask/{id}
pub async fn update_task<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    identity: AuthenticatedIdentity,
    PathParam(id): PathParam<String>,
    JsonBody(req): JsonBody<TaskRequest>,
) -> TrackerResult<Json<DailyTask>> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.tasks().update(&identity, id, req.into()).await?))
}

/// DELETE /dailytask/{id}
pub async fn delete_task<S: TrackerStore>(
    State(state): State<TrackerAppState<S>>,
    identity: AuthenticatedIdentity,
    PathParam(id): PathParam<String>,
) -> TrackerResult<StatusCode> {
    let id = parse_task_id(&id)?;
    state.tasks().delete(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
