//! Repository Traits
//!
//! One store type implements all four in each backend, so a single value
//! can be shared by every use case.

use chrono::NaiveDate;
use kernel::id::{AccountId, CompanyId, ContinentId, CountryId, TaskId};

use crate::domain::entity::{
    Company, CompanyDraft, Continent, ContinentDraft, Country, CountryDraft, DailyTask, TaskDraft,
};
use crate::error::TrackerResult;

#[trait_variant::make(ContinentRepository: Send)]
pub trait LocalContinentRepository {
    /// A duplicate name or code is `TrackerError::Conflict`.
    async fn insert_continent(&self, draft: &ContinentDraft) -> TrackerResult<Continent>;

    async fn find_continent(&self, id: ContinentId) -> TrackerResult<Option<Continent>>;

    async fn find_continent_by_code(&self, code: &str) -> TrackerResult<Option<Continent>>;

    async fn list_continents(&self) -> TrackerResult<Vec<Continent>>;

    /// `None` when the id is unknown.
    async fn update_continent(
        &self,
        id: ContinentId,
        draft: &ContinentDraft,
    ) -> TrackerResult<Option<Continent>>;

    /// `Conflict` while countries still reference it; `false` when unknown.
    async fn delete_continent(&self, id: ContinentId) -> TrackerResult<bool>;
}

#[trait_variant::make(CountryRepository: Send)]
pub trait LocalCountryRepository {
    async fn insert_country(&self, draft: &CountryDraft) -> TrackerResult<Country>;

    async fn find_country(&self, id: CountryId) -> TrackerResult<Option<Country>>;

    async fn find_country_by_code(&self, code: &str) -> TrackerResult<Option<Country>>;

    async fn list_countries(&self) -> TrackerResult<Vec<Country>>;

    async fn list_countries_by_continent(
        &self,
        continent_id: ContinentId,
    ) -> TrackerResult<Vec<Country>>;

    async fn update_country(
        &self,
        id: CountryId,
        draft: &CountryDraft,
    ) -> TrackerResult<Option<Country>>;

    /// `Conflict` while companies still reference it.
    async fn delete_country(&self, id: CountryId) -> TrackerResult<bool>;
}

#[trait_variant::make(CompanyRepository: Send)]
pub trait LocalCompanyRepository {
    async fn insert_company(&self, draft: &CompanyDraft) -> TrackerResult<Company>;

    async fn find_company(&self, id: CompanyId) -> TrackerResult<Option<Company>>;

    async fn find_company_by_code(&self, code: &str) -> TrackerResult<Option<Company>>;

    async fn list_companies(&self) -> TrackerResult<Vec<Company>>;

    async fn list_companies_by_country(&self, country_id: CountryId) -> TrackerResult<Vec<Company>>;

    /// Exact match on the industry label.
    async fn list_companies_by_industry(&self, industry: &str) -> TrackerResult<Vec<Company>>;

    async fn update_company(
        &self,
        id: CompanyId,
        draft: &CompanyDraft,
    ) -> TrackerResult<Option<Company>>;

    async fn delete_company(&self, id: CompanyId) -> TrackerResult<bool>;
}

#[trait_variant::make(DailyTaskRepository: Send)]
pub trait LocalDailyTaskRepository {
    async fn insert_task(&self, owner: AccountId, draft: &TaskDraft) -> TrackerResult<DailyTask>;

    async fn find_task(&self, id: TaskId) -> TrackerResult<Option<DailyTask>>;

    /// Tasks of one owner on one date, ordered by start time.
    async fn list_tasks_by_owner_and_date(
        &self,
        owner: AccountId,
        date: NaiveDate,
    ) -> TrackerResult<Vec<DailyTask>>;

    /// Replace every field except id, owner and creation time.
    async fn replace_task(
        &self,
        id: TaskId,
        owner: AccountId,
        draft: &TaskDraft,
    ) -> TrackerResult<Option<DailyTask>>;

    async fn delete_task(&self, id: TaskId) -> TrackerResult<bool>;
}

/// A complete backend: every tracker repository, shareable across tasks.
pub trait TrackerStore:
    ContinentRepository + CountryRepository + CompanyRepository + DailyTaskRepository + Send + Sync + 'static
{
}

impl<T> TrackerStore for T where
    T: ContinentRepository
        + CountryRepository
        + CompanyRepository
        + DailyTaskRepository
        + Send
        + Sync
        + 'static
{
}
