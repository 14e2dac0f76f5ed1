//! Runtime configuration
//!
//! `Config` is built once at startup from defaults, an optional `.env` file
//! and the process environment, then handed to each component's constructor.
//! CLI flags are applied on top by the binary.

use chrono::Duration;
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::{default_cache_dir, is_route_code};

const DEFAULT_PROVIDER_BASE_URL: &str = "https://test.api.amadeus.com";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_ORIGIN: &str = "SYD";
const DEFAULT_CURRENCY: &str = "AUD";
const DEFAULT_CACHE_EXPIRY_HOURS: i64 = 24;
const DEFAULT_DEPART_OFFSET_DAYS: i64 = 1;
const DEFAULT_RETURN_OFFSET_DAYS: i64 = 10;

/// Fallback cache root when no XDG cache directory can be determined
const FALLBACK_CACHE_DIR: &str = "cache";

/// Errors raised while building the configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// One or more required keys are unset or blank
    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    /// A key is set but its value is unusable
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Destination store endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub prices_endpoint: String,
    pub users_endpoint: String,
    /// Optional bearer token sent with every store request
    pub token: Option<String>,
}

/// Flight provider credentials
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Outgoing mail server
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store: StoreSettings,
    pub provider: ProviderSettings,
    pub smtp: SmtpSettings,
    /// Code of the city every search departs from
    pub origin_code: String,
    /// Currency prices are requested in
    pub currency_code: String,
    /// Root directory for both cache domains
    pub cache_dir: PathBuf,
    /// Hours before a cached route offer goes stale
    pub cache_expiry_hours: i64,
    pub depart_offset_days: i64,
    pub return_offset_days: i64,
}

impl Config {
    /// Builds the configuration from the process environment
    ///
    /// The binary loads `.env` into the environment before calling this.
    /// Email credentials are only required when `require_email` is set.
    pub fn from_env(require_email: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), require_email)
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F, require_email: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |key: &str| match get(key) {
            Some(value) => value,
            None => {
                missing.push(key.to_string());
                String::new()
            }
        };

        let prices_endpoint = required("SHEETY_PRICES_ENDPOINT");
        let users_endpoint = required("SHEETY_USERS_ENDPOINT");
        let api_key = required("AMADEUS_API_KEY");
        let api_secret = required("AMADEUS_API_SECRET");
        let (email_user, email_pass) = if require_email {
            (required("EMAIL_USER"), required("EMAIL_PASS"))
        } else {
            (
                get("EMAIL_USER").unwrap_or_default(),
                get("EMAIL_PASS").unwrap_or_default(),
            )
        };

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let cache_expiry_hours =
            parse_number(&get, "CACHE_EXPIRY_HOURS", DEFAULT_CACHE_EXPIRY_HOURS)?;
        if cache_expiry_hours <= 0 {
            return Err(invalid("CACHE_EXPIRY_HOURS", "must be greater than 0"));
        }

        let depart_offset_days =
            parse_number(&get, "DEPART_OFFSET_DAYS", DEFAULT_DEPART_OFFSET_DAYS)?;
        let return_offset_days =
            parse_number(&get, "RETURN_OFFSET_DAYS", DEFAULT_RETURN_OFFSET_DAYS)?;
        if depart_offset_days < 0 {
            return Err(invalid("DEPART_OFFSET_DAYS", "must be 0 or more"));
        }
        if return_offset_days < depart_offset_days {
            return Err(invalid(
                "RETURN_OFFSET_DAYS",
                "must not be earlier than DEPART_OFFSET_DAYS",
            ));
        }

        let smtp_port = match get("SMTP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| invalid("SMTP_PORT", "must be a port number"))?,
            None => DEFAULT_SMTP_PORT,
        };

        let origin_code = get("ORIGIN_CITY_IATA")
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
            .to_uppercase();
        if !is_route_code(&origin_code) {
            return Err(invalid("ORIGIN_CITY_IATA", "must be letters and digits only"));
        }

        let cache_dir = get("FAREWATCH_CACHE_DIR")
            .map(PathBuf::from)
            .or_else(default_cache_dir)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR));

        Ok(Self {
            store: StoreSettings {
                prices_endpoint,
                users_endpoint,
                token: get("SHEETY_TOKEN"),
            },
            provider: ProviderSettings {
                base_url: get("AMADEUS_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string()),
                api_key,
                api_secret,
            },
            smtp: SmtpSettings {
                host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port: smtp_port,
                user: email_user,
                password: email_pass,
            },
            origin_code,
            currency_code: get("CURRENCY_CODE")
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
                .to_uppercase(),
            cache_dir,
            cache_expiry_hours,
            depart_offset_days,
            return_offset_days,
        })
    }

    /// Freshness window of the route cache
    pub fn freshness_window(&self) -> Duration {
        Duration::hours(self.cache_expiry_hours)
    }

    /// Display symbol for the configured currency
    pub fn currency_symbol(&self) -> &str {
        currency_symbol(&self.currency_code)
    }
}

/// Maps a currency code to its display symbol, falling back to the code
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "AUD" => "A$",
        "USD" => "$",
        "GBP" => "£",
        "EUR" => "€",
        "JPY" => "¥",
        other => other,
    }
}

fn parse_number<G>(get: &G, key: &str, default: i64) -> Result<i64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| invalid(key, "must be a whole number")),
        None => Ok(default),
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
