use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::{WorkloadEntry, WorkloadImportError};
use crate::allocation::domain::{UserId, WorkItemKind};

pub(crate) fn parse_entries<R: Read>(reader: R) -> Result<Vec<WorkloadEntry>, WorkloadImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for (index, record) in csv_reader.deserialize::<WorkloadRow>().enumerate() {
        let row = record?;
        // Header occupies line 1.
        let line = index + 2;

        let kind = parse_kind(&row.kind).ok_or_else(|| WorkloadImportError::UnknownKind {
            line,
            value: row.kind.clone(),
        })?;
        let created_at = parse_timestamp(&row.created_at).ok_or_else(|| {
            WorkloadImportError::InvalidTimestamp {
                line,
                value: row.created_at.clone(),
            }
        })?;
        let completed_at = match row.completed_at.as_deref() {
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
                WorkloadImportError::InvalidTimestamp {
                    line,
                    value: raw.to_string(),
                }
            })?),
            None => None,
        };

        entries.push(WorkloadEntry {
            kind,
            allocated_to: UserId(row.allocated_to),
            created_at,
            completed_at,
        });
    }

    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct WorkloadRow {
    #[serde(rename = "Kind")]
    kind: String,
    #[serde(rename = "Allocated To")]
    allocated_to: String,
    #[serde(rename = "Created At")]
    created_at: String,
    #[serde(
        rename = "Completed At",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    completed_at: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_kind(value: &str) -> Option<WorkItemKind> {
    let normalized: String = value
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect();

    match normalized.as_str() {
        "assessment" => Some(WorkItemKind::Assessment),
        "placement_request" => Some(WorkItemKind::PlacementRequest),
        "placement_application" => Some(WorkItemKind::PlacementApplication),
        _ => None,
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    None
}
