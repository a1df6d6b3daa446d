use serde::{Deserialize, Serialize};

use super::domain::{Qualification, UserId, UserRole};

/// Decision a single rule makes about a work item.
///
/// `AllocateToUser` carries only the identifier; resolving it to an active
/// user is left to the allocator so rules never need repository access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum RuleOutcome {
    Skip,
    DoNotAllocate,
    AllocateToUser(UserId),
    AllocateByQualification(Qualification),
    AllocateByRole(UserRole),
}

impl RuleOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RuleOutcome::Skip)
    }

    pub fn summary(&self) -> String {
        match self {
            RuleOutcome::Skip => "skip".to_string(),
            RuleOutcome::DoNotAllocate => "do not allocate".to_string(),
            RuleOutcome::AllocateToUser(user) => format!("allocate to user {user}"),
            RuleOutcome::AllocateByQualification(qualification) => {
                format!("allocate by qualification {}", qualification.label())
            }
            RuleOutcome::AllocateByRole(role) => format!("allocate by role {}", role.label()),
        }
    }
}
