use super::domain::{Assessment, PlacementApplication, PlacementRequest};
use super::outcome::RuleOutcome;

/// Named, prioritized unit of allocation policy.
///
/// Each work item kind has its own entry point so a rule can answer
/// differently per kind. Evaluation must be side-effect free; a rule with no
/// opinion for a kind returns [`RuleOutcome::Skip`], which is what the
/// provided defaults do.
pub trait AllocationRule: Send + Sync {
    fn name(&self) -> &str;

    /// Lower values are evaluated first.
    fn priority(&self) -> i32;

    fn evaluate_assessment(&self, _assessment: &Assessment) -> RuleOutcome {
        RuleOutcome::Skip
    }

    fn evaluate_placement_request(&self, _placement_request: &PlacementRequest) -> RuleOutcome {
        RuleOutcome::Skip
    }

    fn evaluate_placement_application(
        &self,
        _placement_application: &PlacementApplication,
    ) -> RuleOutcome {
        RuleOutcome::Skip
    }
}
