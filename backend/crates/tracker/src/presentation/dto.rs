//! Request bodies. Responses serialize the domain entities directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::application::{CompanyInput, ContinentInput, CountryInput, TaskInput};
use crate::domain::entity::TaskContent;

#[derive(Debug, Clone, Deserialize)]
pub struct ContinentRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ContinentRequest> for ContinentInput {
    fn from(req: ContinentRequest) -> Self {
        ContinentInput {
            name: req.name,
            code: req.code,
            description: req.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRequest {
    pub name: String,
    pub code: String,
    pub continent_id: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CountryRequest> for CountryInput {
    fn from(req: CountryRequest) -> Self {
        CountryInput {
            name: req.name,
            code: req.code,
            continent_id: req.continent_id,
            description: req.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyRequest {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    pub country_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub founded: Option<i32>,
}

impl From<CompanyRequest> for CompanyInput {
    fn from(req: CompanyRequest) -> Self {
        CompanyInput {
            name: req.name,
            code: req.code,
            country_id: req.country_id,
            description: req.description,
            website: req.website,
            industry: req.industry,
            size: req.size,
            founded: req.founded,
        }
    }
}

/// Create and replace body for a daily task. Any `user_id`, `id` or
/// `task_id` in the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub day: Option<String>,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub productivity_score: i32,
    #[serde(flatten)]
    pub content: TaskContent,
}

impl From<TaskRequest> for TaskInput {
    fn from(req: TaskRequest) -> Self {
        TaskInput {
            day: req.day,
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
            status: req.status,
            score: req.score,
            productivity_score: req.productivity_score,
            content: req.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_request_ignores_owner_and_reads_lists() {
        let req: TaskRequest = serde_json::from_value(serde_json::json!({
            "user_id": 99,
            "date": "2024-01-15",
            "start_time": "2024-01-15T09:00:00Z",
            "end_time": "2024-01-15T17:00:00Z",
            "score": 8,
            "deliverables": [{"item": "report"}],
            "comments": [{"author": "Manager", "content": "ok"}]
        }))
        .unwrap();
        assert_eq!(req.score, 8);
        assert_eq!(req.productivity_score, 0);
        assert_eq!(req.content.deliverables[0].item, "report");
        assert_eq!(req.content.comments[0].author, "Manager");
        assert!(req.content.notes.is_empty());
    }
}
