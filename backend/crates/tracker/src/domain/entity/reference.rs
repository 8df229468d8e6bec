//! Continents, countries and companies.
//!
//! Each `*Draft` is a validated write model; the store assigns ids and
//! timestamps and returns the full entity.

use chrono::{DateTime, Utc};
use kernel::id::{CompanyId, ContinentId, CountryId};
use serde::Serialize;

use crate::domain::value_object::{CompanySize, ContinentCode, CountryCode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Continent {
    pub id: ContinentId,
    pub name: String,
    pub code: ContinentCode,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ContinentDraft {
    pub name: String,
    pub code: ContinentCode,
    pub description: String,
}

impl ContinentDraft {
    pub fn into_continent(self, id: ContinentId, created_at: DateTime<Utc>) -> Continent {
        Continent {
            id,
            name: self.name,
            code: self.code,
            description: self.description,
            created_at,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub code: CountryCode,
    pub continent_id: ContinentId,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CountryDraft {
    pub name: String,
    pub code: CountryCode,
    pub continent_id: ContinentId,
    pub description: String,
}

impl CountryDraft {
    pub fn into_country(self, id: CountryId, created_at: DateTime<Utc>) -> Country {
        Country {
            id,
            name: self.name,
            code: self.code,
            continent_id: self.continent_id,
            description: self.description,
            created_at,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub country_id: CountryId,
    pub description: String,
    pub website: String,
    pub industry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<CompanySize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CompanyDraft {
    pub name: String,
    /// Unique when present.
    pub code: Option<String>,
    pub country_id: CountryId,
    pub description: String,
    pub website: String,
    pub industry: String,
    pub size: Option<CompanySize>,
    pub founded: Option<i32>,
}

impl CompanyDraft {
    pub fn into_company(self, id: CompanyId, created_at: DateTime<Utc>) -> Company {
        Company {
            id,
            name: self.name,
            code: self.code,
            country_id: self.country_id,
            description: self.description,
            website: self.website,
            industry: self.industry,
            size: self.size,
            founded: self.founded,
            created_at,
            updated_at: Utc::now(),
        }
    }
}
