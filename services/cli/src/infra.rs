use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use case_allocation::allocation::{AllocationRule, RuleSetConfig, User, WorkItem};
use case_allocation::error::AppError;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Rule set from `path` when given, otherwise the built-in standard rules.
pub(crate) fn load_rules(path: Option<&Path>) -> Result<Vec<Arc<dyn AllocationRule>>, AppError> {
    let config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading rule set");
            RuleSetConfig::from_path(path)?
        }
        None => RuleSetConfig::standard(),
    };
    Ok(config.build()?)
}

pub(crate) fn load_roster(path: &Path) -> Result<Vec<User>, AppError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub(crate) fn load_work_item(path: &Path) -> Result<WorkItem, AppError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
