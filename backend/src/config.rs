//! Environment-driven configuration.
//!
//! Every limit the validators enforce lives here and is injected at
//! construction; nothing reads the environment after startup.

use anyhow::{bail, Context, Result};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Limits applied to page/size parameters and the historical window.
#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub max_historical_days: i64,
}

/// Names of the document-store collections the API reads from.
#[derive(Debug, Clone)]
pub struct CollectionNames {
    pub transactions: String,
    pub cash_movements: String,
    pub closures: String,
    pub adjustments: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub environment: Environment,
    pub cors_origin: String,
    pub jwt_secret: String,
    pub database_url: String,
    pub api_version: String,
    pub pagination: PaginationConfig,
    pub collections: CollectionNames,
}

impl AppConfig {
    /// Load the configuration from the process environment.
    ///
    /// `JWT_SECRET` is mandatory; everything else falls back to the
    /// defaults the upstream deployment uses.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is required")?;
        if jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };

        Ok(Self {
            port: parse_env("PORT", 3003)?,
            environment,
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            jwt_secret,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:ledger_audit.db".to_string()),
            api_version: env::var("API_VERSION").unwrap_or_else(|_| "v1".to_string()),
            pagination: PaginationConfig {
                default_page_size: parse_env("DEFAULT_PAGE_SIZE", 50)?,
                max_page_size: parse_env("MAX_PAGE_SIZE", 500)?,
                max_historical_days: parse_env("MAX_HISTORICAL_DAYS", 365)?,
            },
            collections: CollectionNames {
                transactions: env::var("COLLECTION_TRANSACTIONS")
                    .unwrap_or_else(|_| "operaciones".to_string()),
                cash_movements: env::var("COLLECTION_CASH_MOVEMENTS")
                    .unwrap_or_else(|_| "movimientos_caja".to_string()),
                closures: env::var("COLLECTION_CLOSURES")
                    .unwrap_or_else(|_| "cierres_caja".to_string()),
                adjustments: env::var("COLLECTION_ADJUSTMENTS")
                    .unwrap_or_else(|_| "ajustes_manuales".to_string()),
            },
        })
    }

    /// Fixed configuration for in-process tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            environment: Environment::Development,
            cors_origin: "*".to_string(),
            jwt_secret: "test-secret-test-secret-test-secret".to_string(),
            database_url: "sqlite::memory:".to_string(),
            api_version: "v1".to_string(),
            pagination: PaginationConfig {
                default_page_size: 50,
                max_page_size: 500,
                max_historical_days: 365,
            },
            collections: CollectionNames {
                transactions: "operaciones".to_string(),
                cash_movements: "movimientos_caja".to_string(),
                closures: "cierres_caja".to_string(),
                adjustments: "ajustes_manuales".to_string(),
            },
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("invalid value for {name}")),
        Err(_) => Ok(default),
    }
}
