//! In-memory workload repository backed by a user roster and a workload export.

mod parser;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Qualification, User, UserId, UserRole, WorkItemKind};
use super::repository::{RepositoryError, WorkloadRepository};

/// One allocated work item as it appears in the workload export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadEntry {
    pub kind: WorkItemKind,
    pub allocated_to: UserId,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkloadEntry {
    /// Items created after `as_of` did not exist yet. Of the rest, pending
    /// items always count and completed ones only inside the window.
    fn counts_towards_load(&self, as_of: DateTime<Utc>, window_start: DateTime<Utc>) -> bool {
        if self.created_at > as_of {
            return false;
        }
        match self.completed_at {
            None => true,
            Some(completed_at) => completed_at >= window_start,
        }
    }
}

/// Point-in-time view of users and their allocated work.
#[derive(Debug, Clone)]
pub struct WorkloadSnapshot {
    users: BTreeMap<UserId, User>,
    entries: Vec<WorkloadEntry>,
    as_of: DateTime<Utc>,
    lookback: Duration,
}

impl WorkloadSnapshot {
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

    pub fn new(users: impl IntoIterator<Item = User>, entries: Vec<WorkloadEntry>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.id.clone(), user))
                .collect(),
            entries,
            as_of: Utc::now(),
            lookback: Duration::days(Self::DEFAULT_LOOKBACK_DAYS),
        }
    }

    pub fn with_reference_time(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    /// Items of `kind` currently counted against `user`.
    pub fn load_for(&self, user: &UserId, kind: WorkItemKind) -> usize {
        let window_start = self.window_start();
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind && &entry.allocated_to == user)
            .filter(|entry| entry.counts_towards_load(self.as_of, window_start))
            .count()
    }

    /// Saturates at the earliest representable instant for very long lookbacks.
    fn window_start(&self) -> DateTime<Utc> {
        self.as_of
            .checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn active_users_matching<F>(&self, predicate: F) -> Vec<User>
    where
        F: Fn(&User) -> bool,
    {
        self.users
            .values()
            .filter(|user| user.is_active && predicate(user))
            .cloned()
            .collect()
    }

    /// Earliest candidate wins when loads are equal.
    fn least_loaded(&self, candidates: &[UserId], kind: WorkItemKind) -> Option<User> {
        candidates
            .iter()
            .filter_map(|id| self.users.get(id))
            .min_by_key(|user| self.load_for(&user.id, kind))
            .cloned()
    }
}

impl WorkloadRepository for WorkloadSnapshot {
    fn find_active_users_with_qualification(
        &self,
        qualification: Qualification,
    ) -> Result<Vec<User>, RepositoryError> {
        Ok(self.active_users_matching(|user| user.has_qualification(qualification)))
    }

    fn find_active_users_with_role(&self, role: UserRole) -> Result<Vec<User>, RepositoryError> {
        Ok(self.active_users_matching(|user| user.has_role(role)))
    }

    fn find_by_identifier(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.get(id).cloned())
    }

    fn find_user_with_least_assessments_pending_or_completed_in_last_week(
        &self,
        candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.least_loaded(candidates, WorkItemKind::Assessment))
    }

    fn find_user_with_least_placement_requests_pending_or_completed_in_last_week(
        &self,
        candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.least_loaded(candidates, WorkItemKind::PlacementRequest))
    }

    fn find_user_with_least_placement_applications_pending_or_completed_in_last_week(
        &self,
        candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.least_loaded(candidates, WorkItemKind::PlacementApplication))
    }
}

/// Reads workload exports with `Kind`, `Allocated To`, `Created At`, and
/// `Completed At` columns.
pub struct WorkloadImporter;

impl WorkloadImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<WorkloadEntry>, WorkloadImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<WorkloadEntry>, WorkloadImportError> {
        parser::parse_entries(reader)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkloadImportError {
    #[error("failed to read workload export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid workload CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: unknown work item kind '{value}'")]
    UnknownKind { line: usize, value: String },
    #[error("line {line}: unparseable timestamp '{value}'")]
    InvalidTimestamp { line: usize, value: String },
}
