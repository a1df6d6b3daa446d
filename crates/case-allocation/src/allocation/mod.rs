//! Caseworker allocation for new assessments, placement requests, and
//! placement applications.
//!
//! A [`UserAllocator`] runs an ordered set of [`AllocationRule`]s against one
//! work item. The first decisive [`RuleOutcome`] is resolved against the
//! [`WorkloadRepository`]; persisting the chosen owner is left to the caller.

mod allocator;
pub mod domain;
mod outcome;
pub mod repository;
mod rule;
pub mod rules;
pub mod workload;

#[cfg(test)]
mod tests;

pub use allocator::{AllocationDecision, AllocationError, UserAllocator};
pub use domain::{
    ApplicationId, ApplicationSummary, Assessment, NoticeType, PlacementApplication,
    PlacementRequest, Qualification, User, UserId, UserRole, WorkItem, WorkItemKind,
};
pub use outcome::RuleOutcome;
pub use repository::{ErrorReporter, RepositoryError, TracingErrorReporter, WorkloadRepository};
pub use rule::AllocationRule;
pub use rules::{RuleConfigError, RuleDefinition, RuleKind, RuleSetConfig};
pub use workload::{WorkloadEntry, WorkloadImportError, WorkloadImporter, WorkloadSnapshot};
