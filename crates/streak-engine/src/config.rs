//! Engine configuration.

use std::env;
use std::time::Duration;

use crate::error::EngineError;

/// Default sweep period (hourly).
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default per-operation deadline for recording and per-user sweep work.
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the streak engine.
#[derive(Debug, Clone)]
pub struct StreakConfig {
    /// Hours without activity after the last activity day ends before a
    /// warning is issued.
    pub warning_hours: i64,
    /// Hours without activity after the last activity day ends before the
    /// streak counts as lost. Must be greater than `warning_hours`.
    pub reset_hours: i64,
    /// How often the notification sweep runs.
    pub sweep_interval: Duration,
    /// Deadline for a single record or per-user sweep operation.
    pub op_timeout: Duration,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            warning_hours: 20,
            reset_hours: 24,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }
}

impl StreakConfig {
    /// Create configuration from environment variables.
    ///
    /// All optional (with defaults):
    /// - `STREAK_WARNING_HOURS` - Default: 20
    /// - `STREAK_RESET_HOURS` - Default: 24
    /// - `STREAK_SWEEP_INTERVAL_MINUTES` - Default: 60
    /// - `STREAK_OP_TIMEOUT_SECS` - Default: 10
    pub fn from_env() -> Result<Self, EngineError> {
        let warning_hours = env_i64("STREAK_WARNING_HOURS", 20)?;
        let reset_hours = env_i64("STREAK_RESET_HOURS", 24)?;
        let sweep_minutes = env_i64("STREAK_SWEEP_INTERVAL_MINUTES", 60)?;
        let op_timeout_secs = env_i64("STREAK_OP_TIMEOUT_SECS", 10)?;

        if sweep_minutes <= 0 || op_timeout_secs <= 0 {
            return Err(EngineError::Config(
                "sweep interval and operation timeout must be positive".to_string(),
            ));
        }

        let config = Self {
            warning_hours,
            reset_hours,
            sweep_interval: Duration::from_secs(sweep_minutes as u64 * 60),
            op_timeout: Duration::from_secs(op_timeout_secs as u64),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check threshold ordering and positivity.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.warning_hours <= 0 || self.reset_hours <= 0 {
            return Err(EngineError::Config(
                "warning and reset hours must be positive".to_string(),
            ));
        }
        if self.warning_hours >= self.reset_hours {
            return Err(EngineError::Config(format!(
                "STREAK_WARNING_HOURS ({}) must be less than STREAK_RESET_HOURS ({})",
                self.warning_hours, self.reset_hours
            )));
        }
        if self.sweep_interval.is_zero() || self.op_timeout.is_zero() {
            return Err(EngineError::Config(
                "sweep interval and operation timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_i64(name: &str, default: i64) -> Result<i64, EngineError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<i64>()
            .map_err(|e| EngineError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
