//! Typed access to environment variables.
//!
//! [`Env`] snapshots the variables once so configuration loading can be
//! tested without touching the process environment.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("required environment variable {0} is not set")]
    Missing(String),

    #[error("environment variable {key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First of `keys` that is set.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_owned()
    }

    pub fn required(&self, key: &str) -> Result<&str, EnvError> {
        self.get(key).ok_or_else(|| EnvError::Missing(key.to_owned()))
    }

    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, EnvError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| EnvError::Invalid {
                key: key.to_owned(),
                value: raw.to_owned(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, EnvError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(EnvError::Invalid {
                    key: key.to_owned(),
                    value: raw.to_owned(),
                    reason: "expected a boolean".to_owned(),
                }),
            },
        }
    }

    pub fn duration(&self, key: &str) -> Result<Option<Duration>, EnvError> {
        self.get(key)
            .map(|raw| {
                parse_duration(raw).map_err(|reason| EnvError::Invalid {
                    key: key.to_owned(),
                    value: raw.to_owned(),
                    reason,
                })
            })
            .transpose()
    }

    pub fn duration_or(&self, key: &str, default: Duration) -> Result<Duration, EnvError> {
        Ok(self.duration(key)?.unwrap_or(default))
    }
}

impl<K, V> FromIterator<(K, V)> for Env
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Parse a duration such as `45s`, `15m`, `24h`, `7d` or `1h 30m`.
///
/// A bare number is seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("45s"), Ok(Duration::from_secs(45)));
        assert_eq!(parse_duration("15m"), Ok(Duration::from_secs(900)));
        assert_eq!(parse_duration("24h"), Ok(Duration::from_secs(86_400)));
        assert_eq!(parse_duration("7d"), Ok(Duration::from_secs(604_800)));
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5_400)));
        assert_eq!(parse_duration("1h 30m"), Ok(Duration::from_secs(5_400)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("2 hours"), Ok(Duration::from_secs(7_200)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("1h30").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn test_duration_error_names_key() {
        let env: Env = [("REQUEST_TIMEOUT", "soon")].into_iter().collect();
        let err = env.duration("REQUEST_TIMEOUT").unwrap_err();
        assert!(matches!(err, EnvError::Invalid { ref key, ref value, .. }
            if key == "REQUEST_TIMEOUT" && value == "soon"));
    }

    #[test]
    fn test_empty_is_unset() {
        let env: Env = [("PORT", "  ")].into_iter().collect();
        assert_eq!(env.get("PORT"), None);
        assert_eq!(env.parse_or("PORT", 3000u16), Ok(3000));
    }

    #[test]
    fn test_required_names_key() {
        let env = Env::default();
        assert_eq!(
            env.required("JWT_SECRET"),
            Err(EnvError::Missing("JWT_SECRET".to_owned()))
        );
    }

    #[test]
    fn test_parse_or_reports_invalid() {
        let env: Env = [("PORT", "eighty")].into_iter().collect();
        let err = env.parse_or("PORT", 3000u16).unwrap_err();
        assert!(matches!(err, EnvError::Invalid { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn test_get_any_prefers_first() {
        let env: Env = [("DSN", "b"), ("DATABASE_URL", "a")].into_iter().collect();
        assert_eq!(env.get_any(&["DATABASE_URL", "DSN"]), Some("a"));
    }

    #[test]
    fn test_bool_and_duration() {
        let env: Env = [("FLAG", "Yes"), ("TTL", "2h")].into_iter().collect();
        assert_eq!(env.bool_or("FLAG", false), Ok(true));
        assert_eq!(env.bool_or("OTHER", false), Ok(false));
        assert_eq!(
            env.duration_or("TTL", Duration::from_secs(1)),
            Ok(Duration::from_secs(7_200))
        );
        assert_eq!(env.duration("MISSING"), Ok(None));
    }
}
