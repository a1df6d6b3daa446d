use super::domain::{Qualification, User, UserId, UserRole};

/// Read-side queries the allocator issues against user and workload storage.
pub trait WorkloadRepository: Send + Sync {
    fn find_active_users_with_qualification(
        &self,
        qualification: Qualification,
    ) -> Result<Vec<User>, RepositoryError>;

    fn find_active_users_with_role(&self, role: UserRole) -> Result<Vec<User>, RepositoryError>;

    fn find_by_identifier(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    fn find_user_with_least_assessments_pending_or_completed_in_last_week(
        &self,
        candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError>;

    fn find_user_with_least_placement_requests_pending_or_completed_in_last_week(
        &self,
        candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError>;

    fn find_user_with_least_placement_applications_pending_or_completed_in_last_week(
        &self,
        candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("repository query failed: {0}")]
    Query(String),
}

/// Operational error tracking hook, kept separate from log output.
pub trait ErrorReporter: Send + Sync {
    fn capture_error_message(&self, message: &str);
}

/// Reporter that forwards captured messages to the `error_report` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn capture_error_message(&self, message: &str) {
        tracing::error!(target: "error_report", "{message}");
    }
}
