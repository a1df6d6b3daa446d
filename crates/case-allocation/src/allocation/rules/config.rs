use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    DefaultRoleRule, EmergencyAssessmentRule, FixedUserRule, FlaggedAssessmentRule,
    WithdrawnApplicationRule, WomensEstateRule,
};
use crate::allocation::domain::{UserId, WorkItemKind};
use crate::allocation::rule::AllocationRule;

/// Ordered list of rule definitions loaded at process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetConfig {
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    WithdrawnApplication,
    EmergencyAssessment,
    EsapAssessment,
    PipeAssessment,
    WomensEstate,
    FixedUser,
    DefaultRole,
}

/// One configured rule. `name`, `user`, and `kinds` only apply to `fixed-user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub rule: RuleKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<WorkItemKind>,
}

fn enabled_by_default() -> bool {
    true
}

impl RuleDefinition {
    pub fn new(rule: RuleKind) -> Self {
        Self {
            rule,
            enabled: true,
            priority: None,
            name: None,
            user: None,
            kinds: Vec::new(),
        }
    }

    pub fn fixed_user(
        name: impl Into<String>,
        priority: i32,
        user: UserId,
        kinds: impl IntoIterator<Item = WorkItemKind>,
    ) -> Self {
        Self {
            rule: RuleKind::FixedUser,
            enabled: true,
            priority: Some(priority),
            name: Some(name.into()),
            user: Some(user),
            kinds: kinds.into_iter().collect(),
        }
    }

    fn to_rule(&self) -> Result<Arc<dyn AllocationRule>, RuleConfigError> {
        let priority_or = |default: i32| self.priority.unwrap_or(default);

        let rule: Arc<dyn AllocationRule> = match self.rule {
            RuleKind::WithdrawnApplication => Arc::new(WithdrawnApplicationRule::new(
                priority_or(WithdrawnApplicationRule::DEFAULT_PRIORITY),
            )),
            RuleKind::EmergencyAssessment => Arc::new(EmergencyAssessmentRule::new(
                priority_or(EmergencyAssessmentRule::DEFAULT_PRIORITY),
            )),
            RuleKind::EsapAssessment => Arc::new(FlaggedAssessmentRule::esap(priority_or(
                FlaggedAssessmentRule::ESAP_DEFAULT_PRIORITY,
            ))),
            RuleKind::PipeAssessment => Arc::new(FlaggedAssessmentRule::pipe(priority_or(
                FlaggedAssessmentRule::PIPE_DEFAULT_PRIORITY,
            ))),
            RuleKind::WomensEstate => Arc::new(WomensEstateRule::new(priority_or(
                WomensEstateRule::DEFAULT_PRIORITY,
            ))),
            RuleKind::DefaultRole => Arc::new(DefaultRoleRule::new(priority_or(
                DefaultRoleRule::DEFAULT_PRIORITY,
            ))),
            RuleKind::FixedUser => {
                let user = self
                    .user
                    .clone()
                    .filter(|user| !user.as_str().trim().is_empty());
                let name = self
                    .name
                    .clone()
                    .or_else(|| user.as_ref().map(|user| format!("fixed-user:{user}")))
                    .unwrap_or_else(|| "fixed-user".to_string());
                let user = user.ok_or_else(|| RuleConfigError::MissingUser(name.clone()))?;
                if self.kinds.is_empty() {
                    return Err(RuleConfigError::NoKinds(name));
                }
                let priority = self
                    .priority
                    .ok_or_else(|| RuleConfigError::MissingPriority(name.clone()))?;
                Arc::new(FixedUserRule::new(
                    name,
                    priority,
                    user,
                    self.kinds.iter().copied(),
                ))
            }
        };

        Ok(rule)
    }
}

impl RuleSetConfig {
    /// Built-in policy: withdrawn, emergency, ESAP, PIPE, women's estate, then
    /// the role fallback.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                RuleDefinition::new(RuleKind::WithdrawnApplication),
                RuleDefinition::new(RuleKind::EmergencyAssessment),
                RuleDefinition::new(RuleKind::EsapAssessment),
                RuleDefinition::new(RuleKind::PipeAssessment),
                RuleDefinition::new(RuleKind::WomensEstate),
                RuleDefinition::new(RuleKind::DefaultRole),
            ],
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleConfigError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RuleConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Validates every definition and returns the enabled rules in
    /// configuration order.
    pub fn build(&self) -> Result<Vec<Arc<dyn AllocationRule>>, RuleConfigError> {
        let mut names = HashSet::new();
        let mut rules = Vec::with_capacity(self.rules.len());

        for definition in &self.rules {
            let rule = definition.to_rule()?;
            if !names.insert(rule.name().to_string()) {
                return Err(RuleConfigError::DuplicateName(rule.name().to_string()));
            }
            if definition.enabled {
                rules.push(rule);
            }
        }

        Ok(rules)
    }
}

impl Default for RuleSetConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Rule-set loading and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum RuleConfigError {
    #[error("failed to read rule set: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rule set JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rule '{0}' is configured more than once")]
    DuplicateName(String),
    #[error("fixed-user rule '{0}' does not name a user")]
    MissingUser(String),
    #[error("fixed-user rule '{0}' does not apply to any work item kind")]
    NoKinds(String),
    #[error("fixed-user rule '{0}' needs an explicit priority")]
    MissingPriority(String),
}
