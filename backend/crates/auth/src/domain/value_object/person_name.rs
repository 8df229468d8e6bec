use kernel::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const NAME_MIN_LENGTH: usize = 2;
const NAME_MAX_LENGTH: usize = 50;

/// First or last name as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonName(String);

impl PersonName {
    /// `field` names the input in the error message.
    pub fn new(raw: impl AsRef<str>, field: &'static str) -> AppResult<Self> {
        let name = raw.as_ref().trim();
        let len = name.chars().count();
        if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&len) {
            return Err(AppError::bad_request(format!(
                "{field} must be between {NAME_MIN_LENGTH} and {NAME_MAX_LENGTH} characters"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(AppError::bad_request(format!("{field} contains invalid characters")));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_name_bounds() {
        assert!(PersonName::new("A", "First name").is_err());
        assert!(PersonName::new("Al", "First name").is_ok());
        assert!(PersonName::new("Zoë", "First name").is_ok());
        let err = PersonName::new("x".repeat(51), "Last name").unwrap_err();
        assert!(err.message().starts_with("Last name"));
    }
}
