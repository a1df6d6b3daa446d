use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{
    Assessment, PlacementApplication, PlacementRequest, User, UserId, WorkItem, WorkItemKind,
};
use super::outcome::RuleOutcome;
use super::repository::{ErrorReporter, RepositoryError, WorkloadRepository};
use super::rule::AllocationRule;

/// Chooses an owner for new work items by running the configured rules in
/// priority order and resolving the first decisive outcome.
pub struct UserAllocator<R, E> {
    rules: Vec<Arc<dyn AllocationRule>>,
    repository: Arc<R>,
    reporter: Arc<E>,
}

/// Result of one allocation run, with the rule that settled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationDecision {
    pub kind: WorkItemKind,
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RuleOutcome>,
}

impl AllocationDecision {
    fn undecided(kind: WorkItemKind) -> Self {
        Self {
            kind,
            user: None,
            decided_by: None,
            outcome: None,
        }
    }

    pub fn summary(&self) -> String {
        match (&self.user, &self.decided_by, &self.outcome) {
            (Some(user), Some(rule), Some(outcome)) => format!(
                "{} allocated to {} ({}) by rule '{}': {}",
                self.kind.label(),
                user.id,
                user.name,
                rule,
                outcome.summary()
            ),
            (None, Some(rule), Some(outcome)) => format!(
                "{} left unallocated by rule '{}': {}",
                self.kind.label(),
                rule,
                outcome.summary()
            ),
            _ => format!("{} left unallocated: no rule applied", self.kind.label()),
        }
    }
}

/// Error raised when an allocation attempt cannot complete.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl<R, E> UserAllocator<R, E>
where
    R: WorkloadRepository + 'static,
    E: ErrorReporter + 'static,
{
    /// Rules are ordered by ascending priority once; equal priorities keep
    /// their configured order.
    pub fn new(
        mut rules: Vec<Arc<dyn AllocationRule>>,
        repository: Arc<R>,
        reporter: Arc<E>,
    ) -> Self {
        rules.sort_by_key(|rule| rule.priority());

        Self {
            rules,
            repository,
            reporter,
        }
    }

    /// Rule names and priorities in evaluation order.
    pub fn rule_order(&self) -> Vec<(String, i32)> {
        self.rules
            .iter()
            .map(|rule| (rule.name().to_string(), rule.priority()))
            .collect()
    }

    pub fn get_user_for_assessment_allocation(
        &self,
        assessment: &Assessment,
    ) -> Result<Option<User>, AllocationError> {
        self.run(WorkItemKind::Assessment, |rule| {
            rule.evaluate_assessment(assessment)
        })
        .map(|decision| decision.user)
    }

    pub fn get_user_for_placement_request_allocation(
        &self,
        placement_request: &PlacementRequest,
    ) -> Result<Option<User>, AllocationError> {
        self.run(WorkItemKind::PlacementRequest, |rule| {
            rule.evaluate_placement_request(placement_request)
        })
        .map(|decision| decision.user)
    }

    pub fn get_user_for_placement_application_allocation(
        &self,
        placement_application: &PlacementApplication,
    ) -> Result<Option<User>, AllocationError> {
        self.run(WorkItemKind::PlacementApplication, |rule| {
            rule.evaluate_placement_application(placement_application)
        })
        .map(|decision| decision.user)
    }

    /// Same algorithm as the per-kind operations, keeping the audit trail.
    pub fn decide(&self, item: &WorkItem) -> Result<AllocationDecision, AllocationError> {
        match item {
            WorkItem::Assessment(assessment) => self.run(item.kind(), |rule| {
                rule.evaluate_assessment(assessment)
            }),
            WorkItem::PlacementRequest(placement_request) => self.run(item.kind(), |rule| {
                rule.evaluate_placement_request(placement_request)
            }),
            WorkItem::PlacementApplication(placement_application) => {
                self.run(item.kind(), |rule| {
                    rule.evaluate_placement_application(placement_application)
                })
            }
        }
    }

    fn run<F>(&self, kind: WorkItemKind, evaluate: F) -> Result<AllocationDecision, AllocationError>
    where
        F: Fn(&dyn AllocationRule) -> RuleOutcome,
    {
        for rule in &self.rules {
            let outcome = evaluate(rule.as_ref());

            let user = match &outcome {
                RuleOutcome::Skip => continue,
                RuleOutcome::DoNotAllocate => None,
                RuleOutcome::AllocateToUser(id) => match self.find_active_user(id)? {
                    Some(user) => Some(user),
                    None => {
                        self.report_unresolved_user(rule.name(), id);
                        continue;
                    }
                },
                RuleOutcome::AllocateByQualification(qualification) => {
                    let candidates = self
                        .repository
                        .find_active_users_with_qualification(*qualification)?;
                    self.least_loaded(kind, candidates)?
                }
                RuleOutcome::AllocateByRole(role) => {
                    let candidates = self.repository.find_active_users_with_role(*role)?;
                    self.least_loaded(kind, candidates)?
                }
            };

            debug!(
                kind = kind.label(),
                rule = rule.name(),
                user = user.as_ref().map(|user| user.id.as_str()),
                "allocation decided"
            );

            return Ok(AllocationDecision {
                kind,
                user,
                decided_by: Some(rule.name().to_string()),
                outcome: Some(outcome),
            });
        }

        debug!(kind = kind.label(), "no allocation rule applied");
        Ok(AllocationDecision::undecided(kind))
    }

    fn find_active_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .repository
            .find_by_identifier(id)?
            .filter(|user| user.is_active))
    }

    fn report_unresolved_user(&self, rule: &str, id: &UserId) {
        let message = format!(
            "Rule '{rule}' attempted to allocate a task to user '{id}', but they could not be found. This rule has been skipped."
        );
        warn!("{message}");
        self.reporter.capture_error_message(&message);
    }

    fn least_loaded(
        &self,
        kind: WorkItemKind,
        candidates: Vec<User>,
    ) -> Result<Option<User>, RepositoryError> {
        if candidates.len() <= 1 {
            if candidates.is_empty() {
                debug!(kind = kind.label(), "no active candidates for allocation");
            }
            return Ok(candidates.into_iter().next());
        }

        let ids: Vec<UserId> = candidates.into_iter().map(|user| user.id).collect();
        match kind {
            WorkItemKind::Assessment => self
                .repository
                .find_user_with_least_assessments_pending_or_completed_in_last_week(&ids),
            WorkItemKind::PlacementRequest => self
                .repository
                .find_user_with_least_placement_requests_pending_or_completed_in_last_week(&ids),
            WorkItemKind::PlacementApplication => self
                .repository
                .find_user_with_least_placement_applications_pending_or_completed_in_last_week(
                    &ids,
                ),
        }
    }
}
