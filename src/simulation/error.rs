//! Configuration errors
//!
//! Collisions and exits are modeled outcomes and never show up here; the
//! only recoverable failure is a run configured with impossible parameters.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive finite number, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("speed thresholds must satisfy panic <= caution <= normal, got {panic} / {caution} / {normal}")]
    ThresholdOrder { panic: f64, caution: f64, normal: f64 },

    #[error("tag window start {start} lies after its end {end}")]
    TagWindow { start: f64, end: f64 },

    #[error("level '{level}' cannot admit {amount} units with capacity {capacity}")]
    LevelRequest {
        level: String,
        amount: u32,
        capacity: u32,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Reject zero, negative, NaN and infinite values
pub fn ensure_positive(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
