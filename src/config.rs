//! Display and threshold settings for the tracker.
//!
//! Defaults match the stock dashboard. [`TrackerConfig::from_env`] lets a
//! deployment override them through `NOVA_*` environment variables.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BudgetError, Result};

/// Environment variable overriding [`TrackerConfig::recent_limit`].
pub const RECENT_LIMIT_ENV: &str = "NOVA_RECENT_LIMIT";
/// Environment variable overriding [`TrackerConfig::currency`].
pub const CURRENCY_ENV: &str = "NOVA_CURRENCY";
/// Environment variable overriding [`TrackerConfig::min_bar_percent`].
pub const MIN_BAR_PERCENT_ENV: &str = "NOVA_MIN_BAR_PERCENT";
/// Environment variable overriding [`TrackerConfig::warning_percent`].
pub const WARNING_PERCENT_ENV: &str = "NOVA_WARNING_PERCENT";
/// Environment variable overriding [`TrackerConfig::danger_percent`].
pub const DANGER_PERCENT_ENV: &str = "NOVA_DANGER_PERCENT";

/// Tracker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Number of transactions shown in the dashboard's recent list.
    pub recent_limit: usize,
    /// Currency label shown next to amounts.
    pub currency: String,
    /// Smallest visible height of a calendar chart bar, in percent.
    pub min_bar_percent: Decimal,
    /// Budget usage (percent) at which progress turns to "warning".
    pub warning_percent: Decimal,
    /// Budget usage (percent) at which progress turns to "danger".
    pub danger_percent: Decimal,
}

impl Default for TrackerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            recent_limit: 5,
            currency: "Rs.".to_owned(),
            min_bar_percent: Decimal::TEN,
            warning_percent: Decimal::from(70_u32),
            danger_percent: Decimal::from(90_u32),
        }
    }
}

impl TrackerConfig {
    /// Builds a configuration from defaults overlaid with any `NOVA_*`
    /// environment variables that are set.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Config`] if a variable is set but cannot be
    /// parsed, or if the resulting thresholds are inconsistent.
    #[inline]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`TrackerConfig::from_env`].
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(RECENT_LIMIT_ENV) {
            config.recent_limit = parse_value(RECENT_LIMIT_ENV, &raw)?;
        }
        if let Some(raw) = lookup(CURRENCY_ENV) {
            config.currency = raw;
        }
        if let Some(raw) = lookup(MIN_BAR_PERCENT_ENV) {
            config.min_bar_percent = parse_value(MIN_BAR_PERCENT_ENV, &raw)?;
        }
        if let Some(raw) = lookup(WARNING_PERCENT_ENV) {
            config.warning_percent = parse_value(WARNING_PERCENT_ENV, &raw)?;
        }
        if let Some(raw) = lookup(DANGER_PERCENT_ENV) {
            config.danger_percent = parse_value(DANGER_PERCENT_ENV, &raw)?;
        }
        config.validate()?;
        tracing::debug!(?config, "loaded tracker configuration");
        Ok(config)
    }

    /// Checks that the percentages are ordered and within `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Config`] describing the first violation.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        let hundred = Decimal::ONE_HUNDRED;
        let in_range = |value: Decimal| value >= Decimal::ZERO && value <= hundred;
        if !in_range(self.min_bar_percent) {
            return Err(BudgetError::Config(format!(
                "{MIN_BAR_PERCENT_ENV} must be within 0..=100, got {}",
                self.min_bar_percent
            )));
        }
        if !in_range(self.warning_percent) || !in_range(self.danger_percent) {
            return Err(BudgetError::Config(
                "budget thresholds must be within 0..=100".to_owned(),
            ));
        }
        if self.warning_percent > self.danger_percent {
            return Err(BudgetError::Config(format!(
                "warning threshold {} is above danger threshold {}",
                self.warning_percent, self.danger_percent
            )));
        }
        Ok(())
    }
}

/// Parses one variable, naming it in the error.
fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| BudgetError::Config(format!("{key}={raw:?}: {err}")))
}
