use std::fmt;

use crate::model::BucketId;

/// Errors found while validating a configuration, before any path runs
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyHorizon,
    NoBuckets,
    /// min > max, or avg outside [min, max]
    InvalidBounds {
        field: String,
        min: f64,
        avg: f64,
        max: f64,
    },
    /// A value that must be non-negative (or strictly positive) is not
    InvalidValue {
        field: String,
        value: f64,
        reason: &'static str,
    },
    /// An expense scheduled at or after the last simulated month
    ExpenseOutsideHorizon {
        field: String,
        month: u32,
        horizon: u32,
    },
    UnknownCurrency {
        bucket: String,
        currency: String,
    },
    DuplicateCurrency(String),
    /// FX settings were supplied for the home currency itself
    HomeCurrencyRate(String),
    DuplicateSpendingPriority {
        priority: u32,
        first: String,
        second: String,
    },
    TriggerTargetMissing {
        bucket: String,
        trigger: usize,
        target: BucketId,
    },
    TriggerSelfReference {
        bucket: String,
        trigger: usize,
    },
    TooManyBuckets(usize),
    InvalidPercentile(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyHorizon => write!(f, "horizon must be at least one month"),
            ConfigError::NoBuckets => write!(f, "at least one bucket is required"),
            ConfigError::InvalidBounds {
                field,
                min,
                avg,
                max,
            } => write!(
                f,
                "{field}: bounds out of order (min={min}, avg={avg}, max={max})"
            ),
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => write!(f, "{field}={value}: {reason}"),
            ConfigError::ExpenseOutsideHorizon {
                field,
                month,
                horizon,
            } => write!(
                f,
                "{field}: month {month} lies outside the {horizon}-month horizon"
            ),
            ConfigError::UnknownCurrency { bucket, currency } => write!(
                f,
                "bucket '{bucket}' uses currency {currency} which has no FX settings"
            ),
            ConfigError::DuplicateCurrency(code) => {
                write!(f, "FX settings for {code} are defined more than once")
            }
            ConfigError::HomeCurrencyRate(code) => {
                write!(f, "{code} is the home currency and cannot have FX settings")
            }
            ConfigError::DuplicateSpendingPriority {
                priority,
                first,
                second,
            } => write!(
                f,
                "buckets '{first}' and '{second}' share spending priority {priority}"
            ),
            ConfigError::TriggerTargetMissing {
                bucket,
                trigger,
                target,
            } => write!(
                f,
                "trigger {trigger} of bucket '{bucket}' references missing bucket {target}"
            ),
            ConfigError::TriggerSelfReference { bucket, trigger } => write!(
                f,
                "trigger {trigger} of bucket '{bucket}' references its own bucket"
            ),
            ConfigError::TooManyBuckets(n) => write!(f, "{n} buckets exceed the supported maximum"),
            ConfigError::InvalidPercentile(p) => {
                write!(f, "percentile {p} must lie strictly between 0 and 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Lot ledger invariant violations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedgerError {
    InsufficientUnits { requested: f64, held: f64 },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InsufficientUnits { requested, held } => {
                write!(f, "cannot sell {requested} units, only {held} held")
            }
        }
    }
}

impl std::error::Error for LedgerError {}

/// Errors that stop a path or a batch
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    Config(ConfigError),
    /// A computed sale exceeded holdings; the path is a defect and is discarded
    Ledger {
        bucket: BucketId,
        month: u32,
        source: LedgerError,
    },
    /// The path observed a cancellation request between months
    Cancelled,
    /// The worker pool could not be created
    ThreadPool(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "invalid configuration: {e}"),
            SimulationError::Ledger {
                bucket,
                month,
                source,
            } => write!(f, "ledger error in bucket {bucket} at month {month}: {source}"),
            SimulationError::Cancelled => write!(f, "simulation cancelled"),
            SimulationError::ThreadPool(msg) => write!(f, "failed to build worker pool: {msg}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Config(e) => Some(e),
            SimulationError::Ledger { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(err: ConfigError) -> Self {
        SimulationError::Config(err)
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
