//! Reference hierarchy use cases: continents, countries, companies.
//!
//! Uniqueness is enforced by the store; parent existence and payload
//! shape are checked here before anything is written.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use kernel::id::{CompanyId, ContinentId, CountryId};

use crate::domain::entity::{
    Company, CompanyDraft, Continent, ContinentDraft, Country, CountryDraft,
};
use crate::domain::repository::{CompanyRepository, ContinentRepository, CountryRepository};
use crate::domain::value_object::{CompanySize, ContinentCode, CountryCode, display_name};
use crate::error::{TrackerError, TrackerResult};

pub const EARLIEST_FOUNDING_YEAR: i32 = 1800;
const MAX_COMPANY_CODE: usize = 20;
const MAX_WEBSITE: usize = 255;

pub struct ContinentInput {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

impl ContinentInput {
    fn into_draft(self) -> TrackerResult<ContinentDraft> {
        Ok(ContinentDraft {
            name: display_name(&self.name, "Name")?,
            code: ContinentCode::new(&self.code)?,
            description: trimmed(self.description),
        })
    }
}

pub struct CountryInput {
    pub name: String,
    pub code: String,
    pub continent_id: i64,
    pub description: Option<String>,
}

impl CountryInput {
    fn into_draft(self) -> TrackerResult<CountryDraft> {
        Ok(CountryDraft {
            name: display_name(&self.name, "Name")?,
            code: CountryCode::new(&self.code)?,
            continent_id: ContinentId::new(self.continent_id),
            description: trimmed(self.description),
        })
    }
}

pub struct CompanyInput {
    pub name: String,
    pub code: Option<String>,
    pub country_id: i64,
    pub description: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub founded: Option<i32>,
}

impl CompanyInput {
    fn into_draft(self) -> TrackerResult<CompanyDraft> {
        let code = self
            .code
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());
        if code.as_ref().is_some_and(|c| c.chars().count() > MAX_COMPANY_CODE) {
            return Err(TrackerError::validation(format!(
                "Company code must be at most {MAX_COMPANY_CODE} characters"
            )));
        }

        let website = trimmed(self.website);
        if website.chars().count() > MAX_WEBSITE {
            return Err(TrackerError::validation(format!(
                "Website must be at most {MAX_WEBSITE} characters"
            )));
        }

        let size = self
            .size
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<CompanySize>)
            .transpose()?;

        let this_year = Utc::now().year();
        if let Some(year) = self.founded {
            if !(EARLIEST_FOUNDING_YEAR..=this_year).contains(&year) {
                return Err(TrackerError::validation(format!(
                    "Founded must be between {EARLIEST_FOUNDING_YEAR} and {this_year}"
                )));
            }
        }

        Ok(CompanyDraft {
            name: display_name(&self.name, "Name")?,
            code,
            country_id: CountryId::new(self.country_id),
            description: trimmed(self.description),
            website,
            industry: trimmed(self.industry),
            size,
            founded: self.founded,
        })
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_owned()).unwrap_or_default()
}

pub struct ReferenceService<S> {
    store: Arc<S>,
}

impl<S> ReferenceService<S>
where
    S: ContinentRepository + CountryRepository + CompanyRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // Continents
    // ------------------------------------------------------------------

    pub async fn create_continent(&self, input: ContinentInput) -> TrackerResult<Continent> {
        let draft = input.into_draft()?;
        let continent = self.store.insert_continent(&draft).await?;
        tracing::info!(continent_id = %continent.id, code = %continent.code, "Continent created");
        Ok(continent)
    }

    pub async fn continent(&self, id: ContinentId) -> TrackerResult<Continent> {
        self.store
            .find_continent(id)
            .await?
            .ok_or(TrackerError::NotFound("Continent"))
    }

    pub async fn continent_by_code(&self, code: &str) -> TrackerResult<Continent> {
        self.store
            .find_continent_by_code(&code.trim().to_ascii_uppercase())
            .await?
            .ok_or(TrackerError::NotFound("Continent"))
    }

    pub async fn continents(&self) -> TrackerResult<Vec<Continent>> {
        self.store.list_continents().await
    }

    pub async fn update_continent(
        &self,
        id: ContinentId,
        input: ContinentInput,
    ) -> TrackerResult<Continent> {
        let draft = input.into_draft()?;
        let continent = self
            .store
            .update_continent(id, &draft)
            .await?
            .ok_or(TrackerError::NotFound("Continent"))?;
        tracing::info!(continent_id = %id, "Continent updated");
        Ok(continent)
    }

    pub async fn delete_continent(&self, id: ContinentId) -> TrackerResult<()> {
        if !self.store.delete_continent(id).await? {
            return Err(TrackerError::NotFound("Continent"));
        }
        tracing::info!(continent_id = %id, "Continent deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Countries
    // ------------------------------------------------------------------

    pub async fn create_country(&self, input: CountryInput) -> TrackerResult<Country> {
        let draft = input.into_draft()?;
        self.require_continent(draft.continent_id).await?;
        let country = self.store.insert_country(&draft).await?;
        tracing::info!(country_id = %country.id, code = %country.code, "Country created");
        Ok(country)
    }

    pub async fn country(&self, id: CountryId) -> TrackerResult<Country> {
        self.store
            .find_country(id)
            .await?
            .ok_or(TrackerError::NotFound("Country"))
    }

    pub async fn country_by_code(&self, code: &str) -> TrackerResult<Country> {
        self.store
            .find_country_by_code(&code.trim().to_ascii_uppercase())
            .await?
            .ok_or(TrackerError::NotFound("Country"))
    }

    pub async fn countries(&self) -> TrackerResult<Vec<Country>> {
        self.store.list_countries().await
    }

    /// Unknown continent is `NotFound`, not an empty list.
    pub async fn countries_in(&self, continent_id: ContinentId) -> TrackerResult<Vec<Country>> {
        self.continent(continent_id).await?;
        self.store.list_countries_by_continent(continent_id).await
    }

    pub async fn update_country(&self, id: CountryId, input: CountryInput) -> TrackerResult<Country> {
        let draft = input.into_draft()?;
        self.require_continent(draft.continent_id).await?;
        let country = self
            .store
            .update_country(id, &draft)
            .await?
            .ok_or(TrackerError::NotFound("Country"))?;
        tracing::info!(country_id = %id, "Country updated");
        Ok(country)
    }

    pub async fn delete_country(&self, id: CountryId) -> TrackerResult<()> {
        if !self.store.delete_country(id).await? {
            return Err(TrackerError::NotFound("Country"));
        }
        tracing::info!(country_id = %id, "Country deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Companies
    // ------------------------------------------------------------------

    pub async fn create_company(&self, input: CompanyInput) -> TrackerResult<Company> {
        let draft = input.into_draft()?;
        self.require_country(draft.country_id).await?;
        let company = self.store.insert_company(&draft).await?;
        tracing::info!(company_id = %company.id, country_id = %company.country_id, "Company created");
        Ok(company)
    }

    pub async fn company(&self, id: CompanyId) -> TrackerResult<Company> {
        self.store
            .find_company(id)
            .await?
            .ok_or(TrackerError::NotFound("Company"))
    }

    pub async fn company_by_code(&self, code: &str) -> TrackerResult<Company> {
        self.store
            .find_company_by_code(code.trim())
            .await?
            .ok_or(TrackerError::NotFound("Company"))
    }

    pub async fn companies(&self) -> TrackerResult<Vec<Company>> {
        self.store.list_companies().await
    }

    pub async fn companies_in(&self, country_id: CountryId) -> TrackerResult<Vec<Company>> {
        self.country(country_id).await?;
        self.store.list_companies_by_country(country_id).await
    }

    pub async fn companies_by_industry(&self, industry: &str) -> TrackerResult<Vec<Company>> {
        let companies = self.store.list_companies_by_industry(industry.trim()).await?;
        tracing::debug!(industry, count = companies.len(), "Companies listed by industry");
        Ok(companies)
    }

    pub async fn update_company(&self, id: CompanyId, input: CompanyInput) -> TrackerResult<Company> {
        let draft = input.into_draft()?;
        self.require_country(draft.country_id).await?;
        let company = self
            .store
            .update_company(id, &draft)
            .await?
            .ok_or(TrackerError::NotFound("Company"))?;
        tracing::info!(company_id = %id, "Company updated");
        Ok(company)
    }

    pub async fn delete_company(&self, id: CompanyId) -> TrackerResult<()> {
        if !self.store.delete_company(id).await? {
            return Err(TrackerError::NotFound("Company"));
        }
        tracing::info!(company_id = %id, "Company deleted");
        Ok(())
    }

    async fn require_continent(&self, id: ContinentId) -> TrackerResult<()> {
        match self.store.find_continent(id).await? {
            Some(_) => Ok(()),
            None => Err(TrackerError::validation(format!(
                "Continent {id} does not exist"
            ))),
        }
    }

    async fn require_country(&self, id: CountryId) -> TrackerResult<()> {
        match self.store.find_country(id).await? {
            Some(_) => Ok(()),
            None => Err(TrackerError::validation(format!("Country {id} does not exist"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryTrackerStore;
    use crate::tests::fixtures;

    fn service() -> ReferenceService<MemoryTrackerStore> {
        ReferenceService::new(Arc::new(MemoryTrackerStore::new()))
    }

    #[tokio::test]
    async fn test_continent_lifecycle() {
        let service = service();
        let created = service
            .create_continent(fixtures::continent("Europe", "eu"))
            .await
            .unwrap();
        assert_eq!(created.code.as_str(), "EU");
        assert_eq!(service.continent_by_code("eu").await.unwrap().id, created.id);

        let renamed = service
            .update_continent(created.id, fixtures::continent("Europa", "EU"))
            .await
            .unwrap();
        assert_eq!(renamed.name, "Europa");
        assert_eq!(renamed.created_at, created.created_at);

        service.delete_continent(created.id).await.unwrap();
        assert!(matches!(
            service.continent(created.id).await,
            Err(TrackerError::NotFound("Continent"))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_continent_code_conflicts() {
        let service = service();
        service
            .create_continent(fixtures::continent("Europe", "EU"))
            .await
            .unwrap();
        let err = service
            .create_continent(fixtures::continent("Eurasia", "eu"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_country_requires_existing_continent() {
        let service = service();
        let err = service
            .create_country(fixtures::country("Germany", "DEU", 99))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_continent_with_countries_conflicts() {
        let service = service();
        let europe = service
            .create_continent(fixtures::continent("Europe", "EU"))
            .await
            .unwrap();
        service
            .create_country(fixtures::country("Germany", "deu", europe.id.value()))
            .await
            .unwrap();

        let err = service.delete_continent(europe.id).await.unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
        assert_eq!(service.countries_in(europe.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_company_lookups() {
        let service = service();
        let europe = service
            .create_continent(fixtures::continent("Europe", "EU"))
            .await
            .unwrap();
        let germany = service
            .create_country(fixtures::country("Germany", "DEU", europe.id.value()))
            .await
            .unwrap();

        let mut input = fixtures::company("Acme", germany.id.value());
        input.code = Some("ACME".into());
        input.industry = Some("Software".into());
        input.size = Some("large".into());
        let acme = service.create_company(input).await.unwrap();
        assert_eq!(acme.size, Some(CompanySize::Large));

        assert_eq!(service.company_by_code("ACME").await.unwrap().id, acme.id);
        assert_eq!(service.companies_in(germany.id).await.unwrap().len(), 1);
        assert_eq!(service.companies_by_industry("Software").await.unwrap().len(), 1);
        assert!(service.companies_by_industry("Retail").await.unwrap().is_empty());

        let err = service.delete_country(germany.id).await.unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_company_validation() {
        let service = service();
        let mut input = fixtures::company("Acme", 1);
        input.size = Some("huge".into());
        assert!(matches!(
            service.create_company(input).await,
            Err(TrackerError::Validation(_))
        ));

        let mut input = fixtures::company("Acme", 1);
        input.founded = Some(1200);
        assert!(matches!(
            service.create_company(input).await,
            Err(TrackerError::Validation(_))
        ));
    }
}
