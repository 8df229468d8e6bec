//! Validated scalar types for the reference hierarchy and daily tasks.

use std::fmt;
use std::str::FromStr;

use derive_more::Display;
use kernel::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Fixed-width alphabetic code, stored upper-case.
///
/// `N` is the exact length: 2 for continents, 3 for countries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AlphaCode<const N: usize>(String);

pub type ContinentCode = AlphaCode<2>;
pub type CountryCode = AlphaCode<3>;

impl<const N: usize> AlphaCode<N> {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let code = raw.as_ref().trim();
        if code.chars().count() != N || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::bad_request(format!(
                "Code must be exactly {} letters",
                N
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn from_db(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> fmt::Display for AlphaCode<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trimmed, non-empty display name of at most 100 characters.
pub fn display_name(raw: &str, field: &'static str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    if name.chars().count() > 100 {
        return Err(AppError::bad_request(format!(
            "{field} must be at most 100 characters"
        )));
    }
    Ok(name.to_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanySize {
    #[display("small")]
    Small,
    #[display("medium")]
    Medium,
    #[display("large")]
    Large,
    #[display("enterprise")]
    Enterprise,
}

impl CompanySize {
    pub const ALL: [CompanySize; 4] = [
        CompanySize::Small,
        CompanySize::Medium,
        CompanySize::Large,
        CompanySize::Enterprise,
    ];

    pub const fn code(&self) -> &'static str {
        match self {
            CompanySize::Small => "small",
            CompanySize::Medium => "medium",
            CompanySize::Large => "large",
            CompanySize::Enterprise => "enterprise",
        }
    }
}

impl FromStr for CompanySize {
    type Err = AppError;

    fn from_str(code: &str) -> AppResult<Self> {
        CompanySize::ALL
            .into_iter()
            .find(|s| s.code() == code.trim())
            .ok_or_else(|| {
                AppError::bad_request("Size must be one of: small, medium, large, enterprise")
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[display("pending")]
    Pending,
    #[display("in_progress")]
    InProgress,
    #[display("completed")]
    Completed,
    #[display("cancelled")]
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub const fn code(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(code: &str) -> AppResult<Self> {
        TaskStatus::ALL
            .into_iter()
            .find(|s| s.code() == code.trim())
            .ok_or_else(|| {
                AppError::bad_request(
                    "Status must be one of: pending, in_progress, completed, cancelled",
                )
            })
    }
}
