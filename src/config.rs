//! Configuration
//!
//! Every tunable is a CLI flag backed by a `WOODEX_*` environment variable. A `.env` file is
//! honoured when present.

use std::{path::Path, time::Duration};

use clap::Args;
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use thiserror::Error;

/// Errors raised while validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The currency code is not an ISO 4217 code.
    #[error("unknown currency code {0:?}")]
    UnknownCurrency(String),

    /// Tax rates are fractions in `[0, 1]`.
    #[error("tax rate {0} is outside 0..=1")]
    TaxRateOutOfRange(Decimal),

    /// The fallback shipping fee is negative.
    #[error("fallback shipping fee {0} is negative")]
    NegativeFallbackShipping(Decimal),

    /// At least one attempt is needed to allocate a reference number.
    #[error("number attempts must be at least 1")]
    ZeroNumberAttempts,

    /// Collaborator calls need a non-zero timeout.
    #[error("collaborator timeout must be greater than zero")]
    ZeroTimeout,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Pricing and workflow settings, as given on the command line or in the environment.
#[derive(Debug, Clone, Args)]
pub struct EngineConfig {
    /// ISO 4217 currency of the storefront
    #[arg(long, env = "WOODEX_CURRENCY", default_value = "PKR")]
    pub currency: String,

    /// Sales tax rate as a fraction
    #[arg(long, env = "WOODEX_TAX_RATE", default_value = "0.17")]
    pub tax_rate: Decimal,

    /// Flat shipping fee used when the delivery calculator is unavailable, in major units
    #[arg(long, env = "WOODEX_FALLBACK_SHIPPING", default_value = "2000")]
    pub fallback_shipping: Decimal,

    /// Timeout for each external collaborator call, in milliseconds
    #[arg(long, env = "WOODEX_COLLABORATOR_TIMEOUT_MS", default_value_t = 5_000)]
    pub collaborator_timeout_ms: u64,

    /// Days a quotation stays valid
    #[arg(long, env = "WOODEX_QUOTE_VALIDITY_DAYS", default_value_t = 30)]
    pub quote_validity_days: u32,

    /// Attempts at allocating a unique order or quote number
    #[arg(long, env = "WOODEX_NUMBER_ATTEMPTS", default_value_t = 3)]
    pub number_attempts: u32,
}

impl EngineConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid setting.
    pub fn settings(&self) -> Result<EngineSettings, ConfigError> {
        let currency = iso::find(self.currency.trim())
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))?;

        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(ConfigError::TaxRateOutOfRange(self.tax_rate));
        }

        if self.fallback_shipping.is_sign_negative() && !self.fallback_shipping.is_zero() {
            return Err(ConfigError::NegativeFallbackShipping(self.fallback_shipping));
        }

        if self.number_attempts == 0 {
            return Err(ConfigError::ZeroNumberAttempts);
        }

        if self.collaborator_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(EngineSettings {
            currency,
            tax_rate: Percentage::from(self.tax_rate),
            fallback_shipping: self.fallback_shipping,
            collaborator_timeout: Duration::from_millis(self.collaborator_timeout_ms),
            quote_validity_days: self.quote_validity_days,
            number_attempts: self.number_attempts,
        })
    }
}

/// Validated settings shared by the engines.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Storefront currency
    pub currency: &'static Currency,

    /// Sales tax rate
    pub tax_rate: Percentage,

    /// Flat shipping fee in major units, used when the calculator fails
    pub fallback_shipping: Decimal,

    /// Timeout for each collaborator call
    pub collaborator_timeout: Duration,

    /// Days a quotation stays valid
    pub quote_validity_days: u32,

    /// Attempts at allocating a unique reference number
    pub number_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            currency: iso::PKR,
            tax_rate: Percentage::from(Decimal::new(17, 2)),
            fallback_shipping: Decimal::from(2_000),
            collaborator_timeout: Duration::from_secs(5),
            quote_validity_days: 30,
            number_attempts: 3,
        }
    }
}

/// Location and credentials of the storefront's edge functions.
#[derive(Debug, Clone, Args)]
pub struct EdgeConfig {
    /// Base URL the edge functions are served under
    #[arg(long, env = "WOODEX_FUNCTIONS_URL")]
    pub functions_url: Option<String>,

    /// API key sent as a bearer token
    #[arg(long, env = "WOODEX_FUNCTIONS_KEY", hide_env_values = true)]
    pub functions_key: Option<String>,
}

/// Loads `path` into the process environment.
///
/// Returns `Ok(false)` when there is no such file; a file that exists but cannot be read or
/// parsed is an error.
///
/// # Errors
///
/// Returns the [`dotenvy::Error`] for an unreadable or malformed file.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(error) if error.not_found() => Ok(false),
        Err(error) => Err(error),
    }
}
