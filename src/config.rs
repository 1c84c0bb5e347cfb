//! # Configuration
//!
//! Tunables for matching and the actor runtime, loaded from the environment (and an
//! optional `.env` file).
//!
//! | Variable | Default |
//! |---|---|
//! | `DISPATCH_STALENESS_SECS` | 300 |
//! | `DISPATCH_RADIUS_KM` | 5.0 |
//! | `DISPATCH_CANDIDATE_LIMIT` | 5 |
//! | `DISPATCH_REQUEST_TIMEOUT_MS` | 5000 |
//! | `DISPATCH_SHARDS` | 8 |
//! | `DISPATCH_MAILBOX_SIZE` | 32 |
//! | `DISPATCH_AUTO_DISPATCH` | true |

use crate::error::ErrorClass;
use chrono::{DateTime, TimeDelta, Utc};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    Constraint(String),
}

impl ConfigError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Drivers whose last report is older than this are not matched.
    pub staleness_cutoff: Duration,
    pub default_radius_km: f64,
    /// How many ranked candidates one dispatch attempt tries.
    pub candidate_limit: usize,
    /// Deadline applied to mutating requests that do not bring their own.
    pub request_timeout: Duration,
    /// Actor shards per component.
    pub shards: usize,
    pub mailbox_size: usize,
    /// Dispatch automatically after `confirm` and `mark_ready`.
    pub auto_dispatch: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            staleness_cutoff: Duration::from_secs(300),
            default_radius_km: 5.0,
            candidate_limit: 5,
            request_timeout: Duration::from_millis(5000),
            shards: 8,
            mailbox_size: 32,
            auto_dispatch: true,
        }
    }
}

impl DispatchConfig {
    /// Loads `.env` if present, then reads the `DISPATCH_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|var| std::env::var(var).ok())?;
        tracing::info!(?config, "Dispatch configuration loaded");
        Ok(config)
    }

    /// Builds a config from an arbitrary variable source; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            staleness_cutoff: parse_var(&lookup, "DISPATCH_STALENESS_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.staleness_cutoff),
            default_radius_km: parse_var(&lookup, "DISPATCH_RADIUS_KM")?
                .unwrap_or(defaults.default_radius_km),
            candidate_limit: parse_var(&lookup, "DISPATCH_CANDIDATE_LIMIT")?
                .unwrap_or(defaults.candidate_limit),
            request_timeout: parse_var(&lookup, "DISPATCH_REQUEST_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            shards: parse_var(&lookup, "DISPATCH_SHARDS")?.unwrap_or(defaults.shards),
            mailbox_size: parse_var(&lookup, "DISPATCH_MAILBOX_SIZE")?
                .unwrap_or(defaults.mailbox_size),
            auto_dispatch: parse_var(&lookup, "DISPATCH_AUTO_DISPATCH")?
                .unwrap_or(defaults.auto_dispatch),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shards == 0 {
            return Err(ConfigError::Constraint("shards must be at least 1".into()));
        }
        if self.mailbox_size == 0 {
            return Err(ConfigError::Constraint("mailbox_size must be at least 1".into()));
        }
        if self.candidate_limit == 0 {
            return Err(ConfigError::Constraint("candidate_limit must be at least 1".into()));
        }
        if !(self.default_radius_km.is_finite() && self.default_radius_km > 0.0) {
            return Err(ConfigError::Constraint("default_radius_km must be positive".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Constraint("request_timeout must be positive".into()));
        }
        Ok(())
    }

    /// Oldest `updated_at` still considered fresh at `now`.
    pub fn fresh_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        cutoff_before(now, self.staleness_cutoff)
    }

    /// Deadline for a request starting now.
    pub fn deadline(&self) -> tokio::time::Instant {
        tokio::time::Instant::now() + self.request_timeout
    }
}

/// `now - age`, saturating at the earliest representable time.
pub(crate) fn cutoff_before(now: DateTime<Utc>, age: Duration) -> DateTime<Utc> {
    let age = TimeDelta::from_std(age).unwrap_or(TimeDelta::MAX);
    now.checked_sub_signed(age)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: var.to_string(),
                value,
            }),
    }
}
