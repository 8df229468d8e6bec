//! Startup configuration read from the process environment.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, bail};
use auth::application::AdminSeed;
use auth::{AuthConfig, OwnershipPolicy};
use auth::application::config::{DEFAULT_AUDIENCE, DEFAULT_ISSUER, DEFAULT_TOKEN_TTL};
use platform::env::Env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Postgres { url: String, max_connections: u32 },
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    /// Administrator created at startup when absent. Set by `ADMIN_EMAIL`.
    pub admin: Option<AdminSeed>,
    pub request_timeout: Option<Duration>,
    pub cors_origins: CorsOrigins,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env(env: &Env) -> anyhow::Result<Self> {
        let host: IpAddr = env
            .parse_or("HOST", IpAddr::from([0, 0, 0, 0]))
            .context("invalid HOST")?;
        let port: u16 = env.parse_or("PORT", 3000).context("invalid PORT")?;

        let store = match env.get_or("DB_DRIVER", "postgres").to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => StoreConfig::Postgres {
                url: env
                    .get_any(&["DATABASE_URL", "DSN"])
                    .context("DATABASE_URL must be set when DB_DRIVER is postgres")?
                    .to_owned(),
                max_connections: env.parse_or("DB_MAX_CONNS", 10).context("invalid DB_MAX_CONNS")?,
            },
            "memory" => StoreConfig::Memory,
            other => bail!("unsupported DB_DRIVER {other:?}, expected postgres or memory"),
        };

        let pepper = env
            .get("PASSWORD_PEPPER")
            .map(platform::crypto::from_base64)
            .transpose()
            .context("PASSWORD_PEPPER must be base64")?;
        let ownership = OwnershipPolicy {
            admin_bypass: env
                .bool_or("ADMIN_BYPASS_OWNERSHIP", false)
                .context("invalid ADMIN_BYPASS_OWNERSHIP")?,
        };
        let auth = AuthConfig::new(env.required("JWT_SECRET")?.as_bytes().to_vec())
            .context("invalid JWT_SECRET")?
            .with_token_ttl(
                env.duration_or("JWT_EXPIRATION", DEFAULT_TOKEN_TTL)
                    .context("invalid JWT_EXPIRATION")?,
            )
            .with_issuer(
                env.get_or("JWT_ISSUER", DEFAULT_ISSUER),
                env.get_or("JWT_AUDIENCE", DEFAULT_AUDIENCE),
            )
            .with_ownership(ownership)
            .with_pepper(pepper);

        let admin = match env.get("ADMIN_EMAIL") {
            None => None,
            Some(email) => Some(AdminSeed {
                email: email.to_owned(),
                username: env.get_or("ADMIN_USERNAME", "admin"),
                password: env
                    .required("ADMIN_PASSWORD")
                    .context("ADMIN_PASSWORD must be set when ADMIN_EMAIL is")?
                    .to_owned(),
                first_name: env.get_or("ADMIN_FIRST_NAME", "Admin"),
                last_name: env.get_or("ADMIN_LAST_NAME", "User"),
            }),
        };

        let cors_origins = match env.get("CORS_ALLOWED_ORIGINS") {
            None | Some("*") => CorsOrigins::Any,
            Some(raw) => CorsOrigins::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_owned)
                    .collect(),
            ),
        };

        let log_format = match env.get_or("LOG_FORMAT", "json").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => bail!("unsupported LOG_FORMAT {other:?}, expected json or pretty"),
        };

        Ok(Self {
            addr: SocketAddr::new(host, port),
            store,
            auth,
            admin,
            request_timeout: env.duration("REQUEST_TIMEOUT").context("invalid REQUEST_TIMEOUT")?,
            cors_origins,
            log_level: env.get_or("LOG_LEVEL", "info"),
            log_format,
        })
    }
}
