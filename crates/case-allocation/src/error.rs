use crate::allocation::{AllocationError, RuleConfigError, WorkloadImportError};
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Rules(RuleConfigError),
    Workload(WorkloadImportError),
    Allocation(AllocationError),
    Input(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Rules(err) => write!(f, "rule configuration error: {}", err),
            AppError::Workload(err) => write!(f, "workload import error: {}", err),
            AppError::Allocation(err) => write!(f, "allocation failed: {}", err),
            AppError::Input(err) => write!(f, "invalid input document: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Rules(err) => Some(err),
            AppError::Workload(err) => Some(err),
            AppError::Allocation(err) => Some(err),
            AppError::Input(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RuleConfigError> for AppError {
    fn from(value: RuleConfigError) -> Self {
        Self::Rules(value)
    }
}

impl From<WorkloadImportError> for AppError {
    fn from(value: WorkloadImportError) -> Self {
        Self::Workload(value)
    }
}

impl From<AllocationError> for AppError {
    fn from(value: AllocationError) -> Self {
        Self::Allocation(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Input(value)
    }
}
