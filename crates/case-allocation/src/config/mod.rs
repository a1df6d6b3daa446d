use std::env;
use std::fmt;
use std::path::PathBuf;

use chrono::Duration;

const DEFAULT_LOOKBACK_DAYS: i64 = 7;
const MAX_LOOKBACK_DAYS: i64 = 3_650;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the allocation tooling.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub allocation: AllocationSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let rules_path = env::var("ALLOCATION_RULES_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let lookback_days = match env::var("ALLOCATION_LOOKBACK_DAYS") {
            Ok(raw) => parse_lookback_days(&raw)?,
            Err(_) => DEFAULT_LOOKBACK_DAYS,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            allocation: AllocationSettings {
                rules_path,
                lookback_days,
            },
        })
    }
}

fn parse_lookback_days(raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(days) if (1..=MAX_LOOKBACK_DAYS).contains(&days) => Ok(days),
        _ => Err(ConfigError::InvalidLookback {
            value: raw.to_string(),
        }),
    }
}

/// Where the rule set comes from and how far back workload is counted.
#[derive(Debug, Clone)]
pub struct AllocationSettings {
    /// JSON rule set; the standard rules apply when unset.
    pub rules_path: Option<PathBuf>,
    pub lookback_days: i64,
}

impl AllocationSettings {
    pub fn lookback(&self) -> Duration {
        Duration::days(self.lookback_days)
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidLookback { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidLookback { value } => write!(
                f,
                "ALLOCATION_LOOKBACK_DAYS must be a whole number of days between 1 and {} (got '{}')",
                MAX_LOOKBACK_DAYS,
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("ALLOCATION_RULES_PATH");
        env::remove_var("ALLOCATION_LOOKBACK_DAYS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.telemetry.ansi);
        assert!(config.allocation.rules_path.is_none());
        assert_eq!(config.allocation.lookback(), Duration::days(7));
    }

    #[test]
    fn reads_rules_path_and_lookback() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("ALLOCATION_RULES_PATH", "/etc/allocation/rules.json");
        env::set_var("ALLOCATION_LOOKBACK_DAYS", "14");

        let config = AppConfig::load().expect("config loads");

        assert_eq!(config.environment, AppEnvironment::Production);
        assert!(!config.telemetry.ansi);
        assert_eq!(
            config.allocation.rules_path,
            Some(PathBuf::from("/etc/allocation/rules.json"))
        );
        assert_eq!(config.allocation.lookback_days, 14);
        reset_env();
    }

    #[test]
    fn rejects_non_positive_lookback() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ALLOCATION_LOOKBACK_DAYS", "0");

        match AppConfig::load() {
            Err(ConfigError::InvalidLookback { value }) => assert_eq!(value, "0"),
            other => panic!("expected invalid lookback, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_lookback_beyond_ten_years() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        for raw in ["3651", "1000000000", "9223372036854775807"] {
            env::set_var("ALLOCATION_LOOKBACK_DAYS", raw);
            match AppConfig::load() {
                Err(ConfigError::InvalidLookback { value }) => assert_eq!(value, raw),
                other => panic!("expected invalid lookback for {raw}, got {other:?}"),
            }
        }

        env::set_var("ALLOCATION_LOOKBACK_DAYS", "3650");
        let config = AppConfig::load().expect("ten years is accepted");
        assert_eq!(config.allocation.lookback(), Duration::days(3_650));
        reset_env();
    }

    #[test]
    fn blank_rules_path_falls_back_to_standard_rules() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ALLOCATION_RULES_PATH", "  ");
        let config = AppConfig::load().expect("config loads");
        assert!(config.allocation.rules_path.is_none());
        reset_env();
    }
}
