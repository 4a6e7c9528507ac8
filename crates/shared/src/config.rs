//! Application configuration management.

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Document database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Business rules and defaults.
    #[serde(default)]
    pub business: BusinessConfig,
    /// Local fallback store configuration.
    #[serde(default)]
    pub local_store: LocalStoreConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Document database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (SQLite or Postgres).
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://sitebook.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Business rules and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct BusinessConfig {
    /// Trading name shown in assistant replies.
    #[serde(default = "default_business_name")]
    pub name: String,
    /// IANA time zone used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Running hours between vehicle services.
    #[serde(default = "default_service_interval_hours")]
    pub service_interval_hours: Decimal,
    /// GST rate (percent) suggested for new invoices.
    #[serde(default = "default_gst_rate")]
    pub default_gst_rate: Decimal,
    /// Maximum number of stock movements kept in the log.
    #[serde(default = "default_stock_log_limit")]
    pub stock_log_limit: usize,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            name: default_business_name(),
            timezone: default_timezone(),
            service_interval_hours: default_service_interval_hours(),
            default_gst_rate: default_gst_rate(),
            stock_log_limit: default_stock_log_limit(),
        }
    }
}

fn default_business_name() -> String {
    "SiteBook".to_string()
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_service_interval_hours() -> Decimal {
    Decimal::from(250)
}

fn default_gst_rate() -> Decimal {
    Decimal::from(18)
}

fn default_stock_log_limit() -> usize {
    50
}

impl BusinessConfig {
    /// Parses the configured time zone.
    pub fn tz(&self) -> AppResult<Tz> {
        Tz::from_str(&self.timezone)
            .map_err(|_| AppError::Validation(format!("unknown time zone: {}", self.timezone)))
    }

    /// Today's date in the business time zone.
    pub fn today(&self) -> AppResult<NaiveDate> {
        Ok(Utc::now().with_timezone(&self.tz()?).date_naive())
    }
}

/// Local fallback store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalStoreConfig {
    /// File holding the key-value pairs.
    #[serde(default = "default_local_store_path")]
    pub path: String,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            path: default_local_store_path(),
        }
    }
}

fn default_local_store_path() -> String {
    "sitebook-local.json".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("SITEBOOK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Checks values that deserialize fine but make no business sense.
    pub fn validate(&self) -> AppResult<()> {
        self.business.tz()?;
        if self.business.service_interval_hours <= Decimal::ZERO {
            return Err(AppError::Validation(
                "service interval hours must be positive".to_string(),
            ));
        }
        if self.business.default_gst_rate < Decimal::ZERO
            || self.business.default_gst_rate > Decimal::ONE_HUNDRED
        {
            return Err(AppError::Validation(
                "default GST rate must be between 0 and 100".to_string(),
            ));
        }
        if self.business.stock_log_limit == 0 {
            return Err(AppError::Validation(
                "stock log limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_without_sources() {
        temp_env::with_vars_unset(
            [
                "SITEBOOK__SERVER__PORT",
                "SITEBOOK__BUSINESS__SERVICE_INTERVAL_HOURS",
                "RUN_MODE",
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.business.service_interval_hours, dec!(250));
                assert_eq!(config.business.default_gst_rate, dec!(18));
                assert_eq!(config.business.stock_log_limit, 50);
                assert_eq!(config.business.timezone, "Asia/Kolkata");
                assert!(config.validate().is_ok());
            },
        );
    }

    #[test]
    fn test_environment_overrides() {
        temp_env::with_vars(
            [
                ("SITEBOOK__SERVER__PORT", Some("9090")),
                ("SITEBOOK__BUSINESS__SERVICE_INTERVAL_HOURS", Some("300")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.business.service_interval_hours, dec!(300));
            },
        );
    }

    #[test]
    fn test_validate_rejects_unknown_timezone() {
        let mut business = BusinessConfig::default();
        business.timezone = "Mars/Olympus".to_string();
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            business,
            local_store: LocalStoreConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_gst_rate() {
        let mut business = BusinessConfig::default();
        business.default_gst_rate = dec!(120);
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            business,
            local_store: LocalStoreConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_today_in_business_timezone() {
        let business = BusinessConfig::default();
        assert!(business.today().is_ok());
    }
}
