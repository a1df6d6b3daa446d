use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier for a caseworker (their staff username).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualification {
    Pipe,
    Esap,
    Emergency,
    Womens,
    Lao,
}

impl Qualification {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pipe => "PIPE",
            Self::Esap => "ESAP",
            Self::Emergency => "Emergency",
            Self::Womens => "Women's Estate",
            Self::Lao => "Limited Access Offender",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Assessor,
    Matcher,
    Manager,
    WorkflowManager,
    ReportViewer,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Assessor => "Assessor",
            Self::Matcher => "Matcher",
            Self::Manager => "Manager",
            Self::WorkflowManager => "Workflow Manager",
            Self::ReportViewer => "Report Viewer",
        }
    }
}

/// Caseworker eligible to own work items while active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub qualifications: BTreeSet<Qualification>,
    #[serde(default)]
    pub roles: BTreeSet<UserRole>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn has_qualification(&self, qualification: Qualification) -> bool {
        self.qualifications.contains(&qualification)
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeType {
    #[default]
    Standard,
    ShortNotice,
    Emergency,
}

/// Application context shared by every kind of work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub crn: String,
    #[serde(default)]
    pub notice_type: NoticeType,
    #[serde(default)]
    pub is_esap: bool,
    #[serde(default)]
    pub is_pipe: bool,
    #[serde(default)]
    pub is_womens: bool,
    #[serde(default)]
    pub is_withdrawn: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub application: ApplicationSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub id: String,
    pub application: ApplicationSummary,
    pub expected_arrival: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementApplication {
    pub id: String,
    pub application: ApplicationSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    Assessment,
    PlacementRequest,
    PlacementApplication,
}

impl WorkItemKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Assessment => "assessment",
            Self::PlacementRequest => "placement request",
            Self::PlacementApplication => "placement application",
        }
    }
}

/// Unit of work awaiting an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkItem {
    Assessment(Assessment),
    PlacementRequest(PlacementRequest),
    PlacementApplication(PlacementApplication),
}

impl WorkItem {
    pub fn kind(&self) -> WorkItemKind {
        match self {
            WorkItem::Assessment(_) => WorkItemKind::Assessment,
            WorkItem::PlacementRequest(_) => WorkItemKind::PlacementRequest,
            WorkItem::PlacementApplication(_) => WorkItemKind::PlacementApplication,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WorkItem::Assessment(item) => &item.id,
            WorkItem::PlacementRequest(item) => &item.id,
            WorkItem::PlacementApplication(item) => &item.id,
        }
    }

    pub fn application(&self) -> &ApplicationSummary {
        match self {
            WorkItem::Assessment(item) => &item.application,
            WorkItem::PlacementRequest(item) => &item.application,
            WorkItem::PlacementApplication(item) => &item.application,
        }
    }
}
