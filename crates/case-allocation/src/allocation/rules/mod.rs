//! Policy rules shipped with the allocator.
//!
//! Each rule inspects only the application context carried by the work item.
//! Priorities are defaults; [`RuleSetConfig`] may override them per rule.

mod config;

pub use config::{RuleConfigError, RuleDefinition, RuleKind, RuleSetConfig};

use std::collections::BTreeSet;

use super::domain::{
    ApplicationSummary, Assessment, NoticeType, PlacementApplication, PlacementRequest,
    Qualification, UserId, UserRole, WorkItemKind,
};
use super::outcome::RuleOutcome;
use super::rule::AllocationRule;

pub const WITHDRAWN_APPLICATION: &str = "withdrawn-application";
pub const EMERGENCY_ASSESSMENT: &str = "emergency-assessment";
pub const ESAP_ASSESSMENT: &str = "esap-assessment";
pub const PIPE_ASSESSMENT: &str = "pipe-assessment";
pub const WOMENS_ESTATE: &str = "womens-estate";
pub const DEFAULT_ROLE: &str = "default-role";

/// Blocks allocation for anything raised against a withdrawn application.
pub struct WithdrawnApplicationRule {
    priority: i32,
}

impl WithdrawnApplicationRule {
    pub const DEFAULT_PRIORITY: i32 = 0;

    pub fn new(priority: i32) -> Self {
        Self { priority }
    }

    fn evaluate(application: &ApplicationSummary) -> RuleOutcome {
        if application.is_withdrawn {
            RuleOutcome::DoNotAllocate
        } else {
            RuleOutcome::Skip
        }
    }
}

impl AllocationRule for WithdrawnApplicationRule {
    fn name(&self) -> &str {
        WITHDRAWN_APPLICATION
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn evaluate_assessment(&self, assessment: &Assessment) -> RuleOutcome {
        Self::evaluate(&assessment.application)
    }

    fn evaluate_placement_request(&self, placement_request: &PlacementRequest) -> RuleOutcome {
        Self::evaluate(&placement_request.application)
    }

    fn evaluate_placement_application(
        &self,
        placement_application: &PlacementApplication,
    ) -> RuleOutcome {
        Self::evaluate(&placement_application.application)
    }
}

/// Emergency and short-notice assessments go to emergency-qualified assessors.
pub struct EmergencyAssessmentRule {
    priority: i32,
}

impl EmergencyAssessmentRule {
    pub const DEFAULT_PRIORITY: i32 = 1;

    pub fn new(priority: i32) -> Self {
        Self { priority }
    }
}

impl AllocationRule for EmergencyAssessmentRule {
    fn name(&self) -> &str {
        EMERGENCY_ASSESSMENT
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn evaluate_assessment(&self, assessment: &Assessment) -> RuleOutcome {
        match assessment.application.notice_type {
            NoticeType::Emergency | NoticeType::ShortNotice => {
                RuleOutcome::AllocateByQualification(Qualification::Emergency)
            }
            NoticeType::Standard => RuleOutcome::Skip,
        }
    }
}

/// Assessments for a flagged application type routed by qualification.
pub struct FlaggedAssessmentRule {
    name: &'static str,
    priority: i32,
    qualification: Qualification,
    flag: fn(&ApplicationSummary) -> bool,
}

impl FlaggedAssessmentRule {
    pub const ESAP_DEFAULT_PRIORITY: i32 = 2;
    pub const PIPE_DEFAULT_PRIORITY: i32 = 3;

    pub fn esap(priority: i32) -> Self {
        Self {
            name: ESAP_ASSESSMENT,
            priority,
            qualification: Qualification::Esap,
            flag: |application| application.is_esap,
        }
    }

    pub fn pipe(priority: i32) -> Self {
        Self {
            name: PIPE_ASSESSMENT,
            priority,
            qualification: Qualification::Pipe,
            flag: |application| application.is_pipe,
        }
    }
}

impl AllocationRule for FlaggedAssessmentRule {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn evaluate_assessment(&self, assessment: &Assessment) -> RuleOutcome {
        if (self.flag)(&assessment.application) {
            RuleOutcome::AllocateByQualification(self.qualification)
        } else {
            RuleOutcome::Skip
        }
    }
}

/// Women's estate work of every kind stays with women's estate specialists.
pub struct WomensEstateRule {
    priority: i32,
}

impl WomensEstateRule {
    pub const DEFAULT_PRIORITY: i32 = 4;

    pub fn new(priority: i32) -> Self {
        Self { priority }
    }

    fn evaluate(application: &ApplicationSummary) -> RuleOutcome {
        if application.is_womens {
            RuleOutcome::AllocateByQualification(Qualification::Womens)
        } else {
            RuleOutcome::Skip
        }
    }
}

impl AllocationRule for WomensEstateRule {
    fn name(&self) -> &str {
        WOMENS_ESTATE
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn evaluate_assessment(&self, assessment: &Assessment) -> RuleOutcome {
        Self::evaluate(&assessment.application)
    }

    fn evaluate_placement_request(&self, placement_request: &PlacementRequest) -> RuleOutcome {
        Self::evaluate(&placement_request.application)
    }

    fn evaluate_placement_application(
        &self,
        placement_application: &PlacementApplication,
    ) -> RuleOutcome {
        Self::evaluate(&placement_application.application)
    }
}

/// Sends the configured kinds of work to one named user.
pub struct FixedUserRule {
    name: String,
    priority: i32,
    user: UserId,
    kinds: BTreeSet<WorkItemKind>,
}

impl FixedUserRule {
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        user: UserId,
        kinds: impl IntoIterator<Item = WorkItemKind>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            user,
            kinds: kinds.into_iter().collect(),
        }
    }

    fn evaluate(&self, kind: WorkItemKind) -> RuleOutcome {
        if self.kinds.contains(&kind) {
            RuleOutcome::AllocateToUser(self.user.clone())
        } else {
            RuleOutcome::Skip
        }
    }
}

impl AllocationRule for FixedUserRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn evaluate_assessment(&self, _assessment: &Assessment) -> RuleOutcome {
        self.evaluate(WorkItemKind::Assessment)
    }

    fn evaluate_placement_request(&self, _placement_request: &PlacementRequest) -> RuleOutcome {
        self.evaluate(WorkItemKind::PlacementRequest)
    }

    fn evaluate_placement_application(
        &self,
        _placement_application: &PlacementApplication,
    ) -> RuleOutcome {
        self.evaluate(WorkItemKind::PlacementApplication)
    }
}

/// Fallback: assessors take assessments, matchers take placement work.
pub struct DefaultRoleRule {
    priority: i32,
}

impl DefaultRoleRule {
    pub const DEFAULT_PRIORITY: i32 = 100;

    pub fn new(priority: i32) -> Self {
        Self { priority }
    }
}

impl AllocationRule for DefaultRoleRule {
    fn name(&self) -> &str {
        DEFAULT_ROLE
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn evaluate_assessment(&self, _assessment: &Assessment) -> RuleOutcome {
        RuleOutcome::AllocateByRole(UserRole::Assessor)
    }

    fn evaluate_placement_request(&self, _placement_request: &PlacementRequest) -> RuleOutcome {
        RuleOutcome::AllocateByRole(UserRole::Matcher)
    }

    fn evaluate_placement_application(
        &self,
        _placement_application: &PlacementApplication,
    ) -> RuleOutcome {
        RuleOutcome::AllocateByRole(UserRole::Matcher)
    }
}
