//! API server configuration.
//!
//! ## Sources (later wins)
//! ```text
//! 1. Defaults (AppConfig::default)
//! 2. ./gstease.toml                     (optional)
//! 3. .env → process environment         (dotenvy)
//! 4. GSTEASE__* environment variables   (GSTEASE__SMTP__HOST → smtp.host)
//! ```

use std::time::Duration;

use chrono::FixedOffset;
use config::{Config, Environment, File};
use gstease_db::{DbConfig, StockSettlement};
use gstease_notify::{DispatcherConfig, SmtpConfig};
use serde::Deserialize;

/// How stock is settled when an invoice is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Invoice commits first; each deduction runs afterwards and a shortfall
    /// becomes a warning on the response.
    #[default]
    BestEffort,

    /// Deductions run inside the invoice transaction; a shortfall rejects
    /// the whole invoice.
    Strict,
}

impl StockPolicy {
    pub fn settlement(&self) -> StockSettlement {
        match self {
            StockPolicy::BestEffort => StockSettlement::Deferred,
            StockPolicy::Strict => StockSettlement::Atomic,
        }
    }
}

/// Where line prices and rates come from for catalog products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Submitted price/rate win; catalog values fill gaps.
    #[default]
    Submitted,

    /// Catalog price/rate always win.
    Catalog,
}

/// Notification queue settings (`notify.*`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    pub queue_capacity: usize,
    pub max_retry_secs: u64,
    /// Deliveries (retries included) running at once
    pub max_in_flight: usize,
}

impl Default for NotifySettings {
    fn default() -> Self {
        NotifySettings {
            queue_capacity: 256,
            max_retry_secs: 60,
            max_in_flight: 8,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    pub stock_policy: StockPolicy,

    pub pricing: PricingMode,

    /// Fresh invoice-number draws after a UNIQUE collision
    pub invoice_number_retries: u32,

    /// Business timezone as minutes east of UTC (India: 330).
    /// Decides where "today" starts on the dashboard.
    pub utc_offset_minutes: i32,

    pub company_name: String,

    /// Recipient for low-stock alerts
    pub admin_email: Option<String>,

    pub smtp: SmtpConfig,

    pub notify: NotifySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            http_port: 8080,
            database_path: "gstease.db".to_string(),
            max_connections: 5,
            stock_policy: StockPolicy::default(),
            pricing: PricingMode::default(),
            invoice_number_retries: 3,
            utc_offset_minutes: 330,
            company_name: "GST Ease Suite".to_string(),
            admin_email: None,
            smtp: SmtpConfig::default(),
            notify: NotifySettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config: AppConfig = Config::builder()
            .add_source(File::with_name("gstease").required(false))
            .add_source(
                Environment::with_prefix("GSTEASE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would only fail later at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.invoice_number_retries == 0 {
            return Err(ConfigError::InvalidValue {
                key: "invoice_number_retries",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.business_offset().is_none() {
            return Err(ConfigError::InvalidValue {
                key: "utc_offset_minutes",
                reason: format!("{} is not a valid UTC offset", self.utc_offset_minutes),
            });
        }
        if self.notify.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "notify.queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.notify.max_in_flight == 0 {
            return Err(ConfigError::InvalidValue {
                key: "notify.max_in_flight",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.smtp.enabled && (self.smtp.user.is_empty() || self.smtp.password.is_empty()) {
            return Err(ConfigError::MissingRequired("smtp.user and smtp.password".to_string()));
        }
        Ok(())
    }

    /// Business timezone.
    pub fn business_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            queue_capacity: self.notify.queue_capacity,
            max_retry: Duration::from_secs(self.notify.max_retry_secs),
            max_in_flight: self.notify.max_in_flight,
            company_name: self.company_name.clone(),
            admin_email: self.admin_email.clone(),
            ..DispatcherConfig::default()
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stock_policy, StockPolicy::BestEffort);
        assert_eq!(config.pricing, PricingMode::Submitted);
        assert_eq!(config.business_offset().unwrap().local_minus_utc(), 19_800);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = AppConfig {
            invoice_number_retries: 0,
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "invoice_number_retries", .. })
        ));

        let config = AppConfig {
            utc_offset_minutes: 24 * 60,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.notify.max_in_flight = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "notify.max_in_flight", .. })
        ));

        let mut config = AppConfig::default();
        config.smtp.enabled = true;
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_policy_names() {
        let policy: StockPolicy = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(policy.settlement(), StockSettlement::Atomic);

        let pricing: PricingMode = serde_json::from_str("\"catalog\"").unwrap();
        assert_eq!(pricing, PricingMode::Catalog);
    }

    #[test]
    fn test_file_source_overrides_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                r#"
                http_port = 9090
                stock_policy = "strict"

                [smtp]
                host = "mail.example.com"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.http_port, 9090);
        assert_eq!(config.stock_policy, StockPolicy::Strict);
        assert_eq!(config.smtp.host, "mail.example.com");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.database_path, "gstease.db");
    }
}
