//! PostgreSQL tracker store.
//!
//! Nested task entries live in one `content` JSONB column; their ids are
//! positions and are re-attached on every read.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{AccountId, CompanyId, ContinentId, CountryId, TaskId};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::domain::entity::{
    Company, CompanyDraft, Continent, ContinentDraft, Country, CountryDraft, DailyTask,
    TaskContent, TaskDraft,
};
use crate::domain::repository::{
    CompanyRepository, ContinentRepository, CountryRepository, DailyTaskRepository,
};
use crate::domain::value_object::{CompanySize, ContinentCode, CountryCode, TaskStatus};
use crate::error::{TrackerError, TrackerResult};

const CONTINENT_COLUMNS: &str = "id, name, code, description, created_at, updated_at";
const COUNTRY_COLUMNS: &str = "id, name, code, continent_id, description, created_at, updated_at";
const COMPANY_COLUMNS: &str = "id, name, code, country_id, description, website, industry, size, \
                               founded, created_at, updated_at";
const TASK_COLUMNS: &str = "id, user_id, day, date, start_time, end_time, status, score, \
                            productivity_score, content, created_at, updated_at";

#[derive(Clone)]
pub struct PgTrackerStore {
    pool: PgPool,
}

impl PgTrackerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Continents
// ============================================================================

impl ContinentRepository for PgTrackerStore {
    async fn insert_continent(&self, draft: &ContinentDraft) -> TrackerResult<Continent> {
        let sql = format!(
            "INSERT INTO continents (name, code, description) VALUES ($1, $2, $3) \
             RETURNING {CONTINENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ContinentRow>(&sql)
            .bind(&draft.name)
            .bind(draft.code.as_str())
            .bind(&draft.description)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.into())
    }

    async fn find_continent(&self, id: ContinentId) -> TrackerResult<Option<Continent>> {
        let sql = format!("SELECT {CONTINENT_COLUMNS} FROM continents WHERE id = $1");
        let row = sqlx::query_as::<_, ContinentRow>(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_continent_by_code(&self, code: &str) -> TrackerResult<Option<Continent>> {
        let sql = format!("SELECT {CONTINENT_COLUMNS} FROM continents WHERE code = $1");
        let row = sqlx::query_as::<_, ContinentRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_continents(&self) -> TrackerResult<Vec<Continent>> {
        let sql = format!("SELECT {CONTINENT_COLUMNS} FROM continents ORDER BY id");
        let rows = sqlx::query_as::<_, ContinentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_continent(
        &self,
        id: ContinentId,
        draft: &ContinentDraft,
    ) -> TrackerResult<Option<Continent>> {
        let sql = format!(
            "UPDATE continents SET name = $2, code = $3, description = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {CONTINENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ContinentRow>(&sql)
            .bind(id.value())
            .bind(&draft.name)
            .bind(draft.code.as_str())
            .bind(&draft.description)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.map(Into::into))
    }

    async fn delete_continent(&self, id: ContinentId) -> TrackerResult<bool> {
        let result = sqlx::query("DELETE FROM continents WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| map_delete_error(e, "Continent still has countries"))?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Countries
// ============================================================================

impl CountryRepository for PgTrackerStore {
    async fn insert_country(&self, draft: &CountryDraft) -> TrackerResult<Country> {
        let sql = format!(
            "INSERT INTO countries (name, code, continent_id, description) \
             VALUES ($1, $2, $3, $4) RETURNING {COUNTRY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CountryRow>(&sql)
            .bind(&draft.name)
            .bind(draft.code.as_str())
            .bind(draft.continent_id.value())
            .bind(&draft.description)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.into())
    }

    async fn find_country(&self, id: CountryId) -> TrackerResult<Option<Country>> {
        let sql = format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE id = $1");
        let row = sqlx::query_as::<_, CountryRow>(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_country_by_code(&self, code: &str) -> TrackerResult<Option<Country>> {
        let sql = format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE code = $1");
        let row = sqlx::query_as::<_, CountryRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_countries(&self) -> TrackerResult<Vec<Country>> {
        let sql = format!("SELECT {COUNTRY_COLUMNS} FROM countries ORDER BY id");
        let rows = sqlx::query_as::<_, CountryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_countries_by_continent(
        &self,
        continent_id: ContinentId,
    ) -> TrackerResult<Vec<Country>> {
        let sql =
            format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE continent_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, CountryRow>(&sql)
            .bind(continent_id.value())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_country(
        &self,
        id: CountryId,
        draft: &CountryDraft,
    ) -> TrackerResult<Option<Country>> {
        let sql = format!(
            "UPDATE countries SET name = $2, code = $3, continent_id = $4, description = $5, \
             updated_at = NOW() WHERE id = $1 RETURNING {COUNTRY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CountryRow>(&sql)
            .bind(id.value())
            .bind(&draft.name)
            .bind(draft.code.as_str())
            .bind(draft.continent_id.value())
            .bind(&draft.description)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.map(Into::into))
    }

    async fn delete_country(&self, id: CountryId) -> TrackerResult<bool> {
        let result = sqlx::query("DELETE FROM countries WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| map_delete_error(e, "Country still has companies"))?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Companies
// ============================================================================

impl CompanyRepository for PgTrackerStore {
    async fn insert_company(&self, draft: &CompanyDraft) -> TrackerResult<Company> {
        let sql = format!(
            "INSERT INTO companies \
             (name, code, country_id, description, website, industry, size, founded) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {COMPANY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(&draft.name)
            .bind(draft.code.as_deref())
            .bind(draft.country_id.value())
            .bind(&draft.description)
            .bind(&draft.website)
            .bind(&draft.industry)
            .bind(draft.size.map(|s| s.code()))
            .bind(draft.founded)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.try_into()
    }

    async fn find_company(&self, id: CompanyId) -> TrackerResult<Option<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1");
        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_company_by_code(&self, code: &str) -> TrackerResult<Option<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE code = $1");
        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_companies(&self) -> TrackerResult<Vec<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY id");
        let rows = sqlx::query_as::<_, CompanyRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_companies_by_country(&self, country_id: CountryId) -> TrackerResult<Vec<Company>> {
        let sql =
            format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE country_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(country_id.value())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_companies_by_industry(&self, industry: &str) -> TrackerResult<Vec<Company>> {
        let sql =
            format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE industry = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(industry)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_company(
        &self,
        id: CompanyId,
        draft: &CompanyDraft,
    ) -> TrackerResult<Option<Company>> {
        let sql = format!(
            "UPDATE companies SET name = $2, code = $3, country_id = $4, description = $5, \
             website = $6, industry = $7, size = $8, founded = $9, updated_at = NOW() \
             WHERE id = $1 RETURNING {COMPANY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(id.value())
            .bind(&draft.name)
            .bind(draft.code.as_deref())
            .bind(draft.country_id.value())
            .bind(&draft.description)
            .bind(&draft.website)
            .bind(&draft.industry)
            .bind(draft.size.map(|s| s.code()))
            .bind(draft.founded)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn delete_company(&self, id: CompanyId) -> TrackerResult<bool> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Daily tasks
// ============================================================================

impl DailyTaskRepository for PgTrackerStore {
    async fn insert_task(&self, owner: AccountId, draft: &TaskDraft) -> TrackerResult<DailyTask> {
        let sql = format!(
            "INSERT INTO daily_tasks \
             (user_id, day, date, start_time, end_time, status, score, productivity_score, content) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(owner.value())
            .bind(&draft.day)
            .bind(draft.date)
            .bind(draft.start_time)
            .bind(draft.end_time)
            .bind(draft.status.code())
            .bind(draft.score)
            .bind(draft.productivity_score)
            .bind(Json(&draft.content))
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.try_into()
    }

    async fn find_task(&self, id: TaskId) -> TrackerResult<Option<DailyTask>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM daily_tasks WHERE id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_tasks_by_owner_and_date(
        &self,
        owner: AccountId,
        date: NaiveDate,
    ) -> TrackerResult<Vec<DailyTask>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM daily_tasks WHERE user_id = $1 AND date = $2 \
             ORDER BY start_time, id"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(owner.value())
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn replace_task(
        &self,
        id: TaskId,
        owner: AccountId,
        draft: &TaskDraft,
    ) -> TrackerResult<Option<DailyTask>> {
        let sql = format!(
            "UPDATE daily_tasks SET user_id = $2, day = $3, date = $4, start_time = $5, \
             end_time = $6, status = $7, score = $8, productivity_score = $9, content = $10, \
             updated_at = NOW() WHERE id = $1 RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id.value())
            .bind(owner.value())
            .bind(&draft.day)
            .bind(draft.date)
            .bind(draft.start_time)
            .bind(draft.end_time)
            .bind(draft.status.code())
            .bind(draft.score)
            .bind(draft.productivity_score)
            .bind(Json(&draft.content))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn delete_task(&self, id: TaskId) -> TrackerResult<bool> {
        let result = sqlx::query("DELETE FROM daily_tasks WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Error mapping
// ============================================================================

/// Unique violations become conflicts named after their constraint.
fn map_write_error(err: sqlx::Error) -> TrackerError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let message = match db.constraint() {
                Some("continents_name_key") => "Continent name already exists",
                Some("continents_code_key") => "Continent code already exists",
                Some("countries_code_key") => "Country code already exists",
                Some("companies_code_key") => "Company code already exists",
                _ => "Record already exists",
            };
            return TrackerError::conflict(message);
        }
        if db.is_foreign_key_violation() {
            return TrackerError::validation("Referenced record does not exist");
        }
    }
    TrackerError::Database(err)
}

fn map_delete_error(err: sqlx::Error, still_referenced: &'static str) -> TrackerError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            TrackerError::conflict(still_referenced)
        }
        _ => TrackerError::Database(err),
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(sqlx::FromRow)]
struct ContinentRow {
    id: i64,
    name: String,
    code: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContinentRow> for Continent {
    fn from(row: ContinentRow) -> Self {
        Continent {
            id: ContinentId::new(row.id),
            name: row.name,
            code: ContinentCode::from_db(row.code),
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CountryRow {
    id: i64,
    name: String,
    code: String,
    continent_id: i64,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CountryRow> for Country {
    fn from(row: CountryRow) -> Self {
        Country {
            id: CountryId::new(row.id),
            name: row.name,
            code: CountryCode::from_db(row.code),
            continent_id: ContinentId::new(row.continent_id),
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: i64,
    name: String,
    code: Option<String>,
    country_id: i64,
    description: String,
    website: String,
    industry: String,
    size: Option<String>,
    founded: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CompanyRow> for Company {
    type Error = TrackerError;

    fn try_from(row: CompanyRow) -> TrackerResult<Self> {
        let size = row
            .size
            .as_deref()
            .map(str::parse::<CompanySize>)
            .transpose()
            .map_err(|_| TrackerError::Internal(format!("company {} has unknown size", row.id)))?;
        Ok(Company {
            id: CompanyId::new(row.id),
            name: row.name,
            code: row.code,
            country_id: CountryId::new(row.country_id),
            description: row.description,
            website: row.website,
            industry: row.industry,
            size,
            founded: row.founded,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    user_id: i64,
    day: String,
    date: NaiveDate,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    score: i32,
    productivity_score: i32,
    content: Json<TaskContent>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for DailyTask {
    type Error = TrackerError;

    fn try_from(row: TaskRow) -> TrackerResult<Self> {
        let id = TaskId::new(row.id);
        let status = row
            .status
            .parse::<TaskStatus>()
            .map_err(|_| TrackerError::Internal(format!("task {} has unknown status", row.id)))?;
        let mut content = row.content.0;
        content.attach(id);
        Ok(DailyTask {
            id,
            user_id: AccountId::new(row.user_id),
            day: row.day,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            status,
            score: row.score,
            productivity_score: row.productivity_score,
            content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
