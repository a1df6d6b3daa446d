use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Where the active log filter directive was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    RustLog,
    AppLogLevel,
}

impl FilterSource {
    const fn variable(self) -> &'static str {
        match self {
            Self::RustLog => "RUST_LOG",
            Self::AppLogLevel => "APP_LOG_LEVEL",
        }
    }
}

#[derive(Debug)]
pub enum TelemetryError {
    InvalidFilter {
        source_var: FilterSource,
        directive: String,
        source: ParseError,
    },
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidFilter {
                source_var,
                directive,
                ..
            } => write!(
                f,
                "{} holds an unusable log filter '{}'",
                source_var.variable(),
                directive
            ),
            TelemetryError::AlreadyInstalled(err) => {
                write!(f, "a global tracing subscriber is already installed: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidFilter { source, .. } => Some(source),
            TelemetryError::AlreadyInstalled(err) => Some(&**err),
        }
    }
}

/// `RUST_LOG` wins over the configured level when it is set; a malformed
/// value is an error rather than a silent fallback.
pub(crate) fn env_filter(
    rust_log: Option<&str>,
    config: &TelemetryConfig,
) -> Result<EnvFilter, TelemetryError> {
    let (source_var, directive) = match rust_log.map(str::trim) {
        Some(value) if !value.is_empty() => (FilterSource::RustLog, value),
        _ => (FilterSource::AppLogLevel, config.log_level.as_str()),
    };

    EnvFilter::try_new(directive).map_err(|source| TelemetryError::InvalidFilter {
        source_var,
        directive: directive.to_string(),
        source,
    })
}

/// Installs the global subscriber. Events go to stderr so command output on
/// stdout stays parseable.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = env_filter(rust_log.as_deref(), config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(config.ansi)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}
