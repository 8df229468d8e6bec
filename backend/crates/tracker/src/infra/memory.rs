//! In-memory tracker store.
//!
//! Mirrors the PostgreSQL schema's constraints: unique codes and names,
//! and parents that cannot be deleted while children reference them.
//! As the accounts' [`AccountLinks`] it also stands in for the account
//! foreign keys: organisation ids must exist and tasks go with their owner.

use std::collections::BTreeMap;
use std::sync::Arc;

use auth::{AccountLinks, AuthResult};
use chrono::{NaiveDate, Utc};
use kernel::id::{AccountId, CompanyId, ContinentId, CountryId, TaskId};
use tokio::sync::RwLock;

use crate::domain::entity::{
    Company, CompanyDraft, Continent, ContinentDraft, Country, CountryDraft, DailyTask, TaskDraft,
};
use crate::domain::repository::{
    CompanyRepository, ContinentRepository, CountryRepository, DailyTaskRepository,
};
use crate::error::{TrackerError, TrackerResult};

#[derive(Default)]
struct Tables {
    last_continent: i64,
    last_country: i64,
    last_company: i64,
    last_task: i64,
    continents: BTreeMap<ContinentId, Continent>,
    countries: BTreeMap<CountryId, Country>,
    companies: BTreeMap<CompanyId, Company>,
    tasks: BTreeMap<TaskId, DailyTask>,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Tables {
    fn check_continent(&self, draft: &ContinentDraft, except: Option<ContinentId>) -> TrackerResult<()> {
        let others = self.continents.values().filter(|c| Some(c.id) != except);
        for other in others {
            if other.code == draft.code {
                return Err(TrackerError::conflict("Continent code already exists"));
            }
            if other.name == draft.name {
                return Err(TrackerError::conflict("Continent name already exists"));
            }
        }
        Ok(())
    }

    fn check_country(&self, draft: &CountryDraft, except: Option<CountryId>) -> TrackerResult<()> {
        if self
            .countries
            .values()
            .any(|c| Some(c.id) != except && c.code == draft.code)
        {
            return Err(TrackerError::conflict("Country code already exists"));
        }
        Ok(())
    }

    fn check_company(&self, draft: &CompanyDraft, except: Option<CompanyId>) -> TrackerResult<()> {
        let Some(code) = draft.code.as_deref() else {
            return Ok(());
        };
        if self
            .companies
            .values()
            .any(|c| Some(c.id) != except && c.code.as_deref() == Some(code))
        {
            return Err(TrackerError::conflict("Company code already exists"));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryTrackerStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryTrackerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContinentRepository for MemoryTrackerStore {
    async fn insert_continent(&self, draft: &ContinentDraft) -> TrackerResult<Continent> {
        let mut tables = self.inner.write().await;
        tables.check_continent(draft, None)?;
        let id = ContinentId::new(next(&mut tables.last_continent));
        let continent = draft.clone().into_continent(id, Utc::now());
        tables.continents.insert(id, continent.clone());
        Ok(continent)
    }

    async fn find_continent(&self, id: ContinentId) -> TrackerResult<Option<Continent>> {
        Ok(self.inner.read().await.continents.get(&id).cloned())
    }

    async fn find_continent_by_code(&self, code: &str) -> TrackerResult<Option<Continent>> {
        let tables = self.inner.read().await;
        Ok(tables
            .continents
            .values()
            .find(|c| c.code.as_str() == code)
            .cloned())
    }

    async fn list_continents(&self) -> TrackerResult<Vec<Continent>> {
        Ok(self.inner.read().await.continents.values().cloned().collect())
    }

    async fn update_continent(
        &self,
        id: ContinentId,
        draft: &ContinentDraft,
    ) -> TrackerResult<Option<Continent>> {
        let mut tables = self.inner.write().await;
        let Some(created_at) = tables.continents.get(&id).map(|c| c.created_at) else {
            return Ok(None);
        };
        tables.check_continent(draft, Some(id))?;
        let continent = draft.clone().into_continent(id, created_at);
        tables.continents.insert(id, continent.clone());
        Ok(Some(continent))
    }

    async fn delete_continent(&self, id: ContinentId) -> TrackerResult<bool> {
        let mut tables = self.inner.write().await;
        if !tables.continents.contains_key(&id) {
            return Ok(false);
        }
        if tables.countries.values().any(|c| c.continent_id == id) {
            return Err(TrackerError::conflict("Continent still has countries"));
        }
        Ok(tables.continents.remove(&id).is_some())
    }
}

impl CountryRepository for MemoryTrackerStore {
    async fn insert_country(&self, draft: &CountryDraft) -> TrackerResult<Country> {
        let mut tables = self.inner.write().await;
        tables.check_country(draft, None)?;
        let id = CountryId::new(next(&mut tables.last_country));
        let country = draft.clone().into_country(id, Utc::now());
        tables.countries.insert(id, country.clone());
        Ok(country)
    }

    async fn find_country(&self, id: CountryId) -> TrackerResult<Option<Country>> {
        Ok(self.inner.read().await.countries.get(&id).cloned())
    }

    async fn find_country_by_code(&self, code: &str) -> TrackerResult<Option<Country>> {
        let tables = self.inner.read().await;
        Ok(tables
            .countries
            .values()
            .find(|c| c.code.as_str() == code)
            .cloned())
    }

    async fn list_countries(&self) -> TrackerResult<Vec<Country>> {
        Ok(self.inner.read().await.countries.values().cloned().collect())
    }

    async fn list_countries_by_continent(
        &self,
        continent_id: ContinentId,
    ) -> TrackerResult<Vec<Country>> {
        let tables = self.inner.read().await;
        Ok(tables
            .countries
            .values()
            .filter(|c| c.continent_id == continent_id)
            .cloned()
            .collect())
    }

    async fn update_country(
        &self,
        id: CountryId,
        draft: &CountryDraft,
    ) -> TrackerResult<Option<Country>> {
        let mut tables = self.inner.write().await;
        let Some(created_at) = tables.countries.get(&id).map(|c| c.created_at) else {
            return Ok(None);
        };
        tables.check_country(draft, Some(id))?;
        let country = draft.clone().into_country(id, created_at);
        tables.countries.insert(id, country.clone());
        Ok(Some(country))
    }

    async fn delete_country(&self, id: CountryId) -> TrackerResult<bool> {
        let mut tables = self.inner.write().await;
        if !tables.countries.contains_key(&id) {
            return Ok(false);
        }
        if tables.companies.values().any(|c| c.country_id == id) {
            return Err(TrackerError::conflict("Country still has companies"));
        }
        Ok(tables.countries.remove(&id).is_some())
    }
}

impl CompanyRepository for MemoryTrackerStore {
    async fn insert_company(&self, draft: &CompanyDraft) -> TrackerResult<Company> {
        let mut tables = self.inner.write().await;
        tables.check_company(draft, None)?;
        let id = CompanyId::new(next(&mut tables.last_company));
        let company = draft.clone().into_company(id, Utc::now());
        tables.companies.insert(id, company.clone());
        Ok(company)
    }

    async fn find_company(&self, id: CompanyId) -> TrackerResult<Option<Company>> {
        Ok(self.inner.read().await.companies.get(&id).cloned())
    }

    async fn find_company_by_code(&self, code: &str) -> TrackerResult<Option<Company>> {
        let tables = self.inner.read().await;
        Ok(tables
            .companies
            .values()
            .find(|c| c.code.as_deref() == Some(code))
            .cloned())
    }

    async fn list_companies(&self) -> TrackerResult<Vec<Company>> {
        Ok(self.inner.read().await.companies.values().cloned().collect())
    }

    async fn list_companies_by_country(&self, country_id: CountryId) -> TrackerResult<Vec<Company>> {
        let tables = self.inner.read().await;
        Ok(tables
            .companies
            .values()
            .filter(|c| c.country_id == country_id)
            .cloned()
            .collect())
    }

    async fn list_companies_by_industry(&self, industry: &str) -> TrackerResult<Vec<Company>> {
        let tables = self.inner.read().await;
        Ok(tables
            .companies
            .values()
            .filter(|c| c.industry == industry)
            .cloned()
            .collect())
    }

    async fn update_company(
        &self,
        id: CompanyId,
        draft: &CompanyDraft,
    ) -> TrackerResult<Option<Company>> {
        let mut tables = self.inner.write().await;
        let Some(created_at) = tables.companies.get(&id).map(|c| c.created_at) else {
            return Ok(None);
        };
        tables.check_company(draft, Some(id))?;
        let company = draft.clone().into_company(id, created_at);
        tables.companies.insert(id, company.clone());
        Ok(Some(company))
    }

    async fn delete_company(&self, id: CompanyId) -> TrackerResult<bool> {
        Ok(self.inner.write().await.companies.remove(&id).is_some())
    }
}

impl DailyTaskRepository for MemoryTrackerStore {
    async fn insert_task(&self, owner: AccountId, draft: &TaskDraft) -> TrackerResult<DailyTask> {
        let mut tables = self.inner.write().await;
        let id = TaskId::new(next(&mut tables.last_task));
        let task = draft.clone().into_task(id, owner, Utc::now());
        tables.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: TaskId) -> TrackerResult<Option<DailyTask>> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks_by_owner_and_date(
        &self,
        owner: AccountId,
        date: NaiveDate,
    ) -> TrackerResult<Vec<DailyTask>> {
        let tables = self.inner.read().await;
        let mut tasks: Vec<_> = tables
            .tasks
            .values()
            .filter(|t| t.user_id == owner && t.date == date)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.start_time, t.id));
        Ok(tasks)
    }

    async fn replace_task(
        &self,
        id: TaskId,
        owner: AccountId,
        draft: &TaskDraft,
    ) -> TrackerResult<Option<DailyTask>> {
        let mut tables = self.inner.write().await;
        let Some(created_at) = tables.tasks.get(&id).map(|t| t.created_at) else {
            return Ok(None);
        };
        let task = draft.clone().into_task(id, owner, created_at);
        tables.tasks.insert(id, task.clone());
        Ok(Some(task))
    }

    async fn delete_task(&self, id: TaskId) -> TrackerResult<bool> {
        Ok(self.inner.write().await.tasks.remove(&id).is_some())
    }
}

impl AccountLinks for MemoryTrackerStore {
    async fn country_exists(&self, id: CountryId) -> AuthResult<bool> {
        Ok(self.inner.read().await.countries.contains_key(&id))
    }

    async fn company_exists(&self, id: CompanyId) -> AuthResult<bool> {
        Ok(self.inner.read().await.companies.contains_key(&id))
    }

    async fn release_account(&self, id: AccountId) -> AuthResult<()> {
        let mut tables = self.inner.write().await;
        let before = tables.tasks.len();
        tables.tasks.retain(|_, task| task.user_id != id);
        tracing::debug!(
            account_id = %id,
            removed = before - tables.tasks.len(),
            "Released tasks of deleted account"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{ContinentCode, CountryCode, TaskStatus};
    use crate::tests::fixtures;

    fn europe() -> ContinentDraft {
        ContinentDraft {
            name: "Europe".into(),
            code: ContinentCode::new("EU").unwrap(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_update_keeps_unique_against_self() {
        let store = MemoryTrackerStore::new();
        let continent = store.insert_continent(&europe()).await.unwrap();

        let mut draft = europe();
        draft.description = "Old world".into();
        let updated = store
            .update_continent(continent.id, &draft)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.description, "Old world");
        assert!(store
            .update_continent(ContinentId::new(77), &draft)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_country_code_unique() {
        let store = MemoryTrackerStore::new();
        let continent = store.insert_continent(&europe()).await.unwrap();
        let draft = CountryDraft {
            name: "Germany".into(),
            code: CountryCode::new("DEU").unwrap(),
            continent_id: continent.id,
            description: String::new(),
        };
        store.insert_country(&draft).await.unwrap();
        assert!(matches!(
            store.insert_country(&draft).await,
            Err(TrackerError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_false() {
        let store = MemoryTrackerStore::new();
        assert!(!store.delete_continent(ContinentId::new(1)).await.unwrap());
        assert!(!store.delete_task(TaskId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_account_drops_only_their_tasks() {
        let store = MemoryTrackerStore::new();
        let alice = AccountId::new(1);
        let bob = AccountId::new(2);
        let input = fixtures::task_input();
        let draft = TaskDraft {
            day: "Monday".into(),
            date: input.date,
            start_time: input.start_time,
            end_time: input.end_time,
            status: TaskStatus::Pending,
            score: input.score,
            productivity_score: input.productivity_score,
            content: input.content,
        };
        store.insert_task(alice, &draft).await.unwrap();
        store.insert_task(alice, &draft).await.unwrap();
        let kept = store.insert_task(bob, &draft).await.unwrap();

        store.release_account(alice).await.unwrap();

        let date = fixtures::task_date();
        assert!(store.list_tasks_by_owner_and_date(alice, date).await.unwrap().is_empty());
        let remaining = store.list_tasks_by_owner_and_date(bob, date).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_organisation_lookups() {
        let store = MemoryTrackerStore::new();
        assert!(!store.country_exists(CountryId::new(1)).await.unwrap());

        let continent = store.insert_continent(&europe()).await.unwrap();
        let country = store
            .insert_country(&CountryDraft {
                name: "Germany".into(),
                code: CountryCode::new("DEU").unwrap(),
                continent_id: continent.id,
                description: String::new(),
            })
            .await
            .unwrap();
        assert!(store.country_exists(country.id).await.unwrap());
        assert!(!store.company_exists(CompanyId::new(1)).await.unwrap());
    }
}
