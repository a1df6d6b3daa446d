use std::collections::{BTreeSet, HashMap};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing_subscriber::fmt::MakeWriter;

use crate::allocation::domain::{
    ApplicationId, ApplicationSummary, Assessment, NoticeType, PlacementApplication,
    PlacementRequest, Qualification, User, UserId, UserRole, WorkItemKind,
};
use crate::allocation::repository::{ErrorReporter, RepositoryError, WorkloadRepository};
use crate::allocation::{AllocationRule, RuleOutcome, UserAllocator};

pub(super) fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0)
        .single()
        .expect("valid reference time")
}

pub(super) fn user(id: &str) -> User {
    User {
        id: UserId::new(id),
        name: format!("{id} Caseworker"),
        qualifications: BTreeSet::new(),
        roles: BTreeSet::new(),
        is_active: true,
    }
}

pub(super) fn qualified_user(id: &str, qualification: Qualification) -> User {
    let mut user = user(id);
    user.qualifications.insert(qualification);
    user
}

pub(super) fn user_with_role(id: &str, role: UserRole) -> User {
    let mut user = user(id);
    user.roles.insert(role);
    user
}

pub(super) fn application() -> ApplicationSummary {
    ApplicationSummary {
        id: ApplicationId("application-001".to_string()),
        crn: "X320741".to_string(),
        notice_type: NoticeType::Standard,
        is_esap: false,
        is_pipe: false,
        is_womens: false,
        is_withdrawn: false,
    }
}

pub(super) fn assessment() -> Assessment {
    Assessment {
        id: "assessment-001".to_string(),
        application: application(),
        created_at: reference_time(),
    }
}

pub(super) fn placement_request() -> PlacementRequest {
    PlacementRequest {
        id: "placement-request-001".to_string(),
        application: application(),
        expected_arrival: NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date"),
        created_at: reference_time(),
    }
}

pub(super) fn placement_application() -> PlacementApplication {
    PlacementApplication {
        id: "placement-application-001".to_string(),
        application: application(),
        created_at: reference_time(),
    }
}

/// Rule answering the same way for every kind and counting its evaluations.
pub(super) struct StubRule {
    name: String,
    priority: i32,
    outcome: RuleOutcome,
    evaluations: AtomicUsize,
}

impl StubRule {
    pub(super) fn new(name: &str, priority: i32, outcome: RuleOutcome) -> Self {
        Self {
            name: name.to_string(),
            priority,
            outcome,
            evaluations: AtomicUsize::new(0),
        }
    }

    pub(super) fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }

    fn answer(&self) -> RuleOutcome {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

impl AllocationRule for StubRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn evaluate_assessment(&self, _assessment: &Assessment) -> RuleOutcome {
        self.answer()
    }

    fn evaluate_placement_request(&self, _placement_request: &PlacementRequest) -> RuleOutcome {
        self.answer()
    }

    fn evaluate_placement_application(
        &self,
        _placement_application: &PlacementApplication,
    ) -> RuleOutcome {
        self.answer()
    }
}

pub(super) fn stub(name: &str, priority: i32, outcome: RuleOutcome) -> Arc<dyn AllocationRule> {
    Arc::new(StubRule::new(name, priority, outcome))
}

/// Repository with fixed users and per-kind workload counts that records the
/// tie-break queries it receives.
#[derive(Default)]
pub(super) struct MemoryRepository {
    users: Vec<User>,
    workload: HashMap<(UserId, WorkItemKind), usize>,
    tie_breaks: Mutex<Vec<(WorkItemKind, Vec<UserId>)>>,
}

impl MemoryRepository {
    pub(super) fn with_users(users: Vec<User>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    pub(super) fn with_workload(mut self, id: &str, kind: WorkItemKind, count: usize) -> Self {
        self.workload.insert((UserId::new(id), kind), count);
        self
    }

    pub(super) fn tie_breaks(&self) -> Vec<(WorkItemKind, Vec<UserId>)> {
        self.tie_breaks
            .lock()
            .expect("repository mutex poisoned")
            .clone()
    }

    fn least_loaded(&self, kind: WorkItemKind, candidates: &[UserId]) -> Option<User> {
        self.tie_breaks
            .lock()
            .expect("repository mutex poisoned")
            .push((kind, candidates.to_vec()));

        candidates
            .iter()
            .filter_map(|id| self.users.iter().find(|user| &user.id == id))
            .min_by_key(|user| {
                self.workload
                    .get(&(user.id.clone(), kind))
                    .copied()
                    .unwrap_or(0)
            })
            .cloned()
    }
}

impl WorkloadRepository for MemoryRepository {
    fn find_active_users_with_qualification(
        &self,
        qualification: Qualification,
    ) -> Result<Vec<User>, RepositoryError> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.is_active && user.has_qualification(qualification))
            .cloned()
            .collect())
    }

    fn find_active_users_with_role(&self, role: UserRole) -> Result<Vec<User>, RepositoryError> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.is_active && user.has_role(role))
            .cloned()
            .collect())
    }

    fn find_by_identifier(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.iter().find(|user| &user.id == id).cloned())
    }

    fn find_user_with_least_assessments_pending_or_completed_in_last_week(
        &self,
        candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.least_loaded(WorkItemKind::Assessment, candidates))
    }

    fn find_user_with_least_placement_requests_pending_or_completed_in_last_week(
        &self,
        candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.least_loaded(WorkItemKind::PlacementRequest, candidates))
    }

    fn find_user_with_least_placement_applications_pending_or_completed_in_last_week(
        &self,
        candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.least_loaded(WorkItemKind::PlacementApplication, candidates))
    }
}

pub(super) struct UnavailableRepository;

impl WorkloadRepository for UnavailableRepository {
    fn find_active_users_with_qualification(
        &self,
        _qualification: Qualification,
    ) -> Result<Vec<User>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_active_users_with_role(&self, _role: UserRole) -> Result<Vec<User>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_identifier(&self, _id: &UserId) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_user_with_least_assessments_pending_or_completed_in_last_week(
        &self,
        _candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_user_with_least_placement_requests_pending_or_completed_in_last_week(
        &self,
        _candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_user_with_least_placement_applications_pending_or_completed_in_last_week(
        &self,
        _candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Answers candidate and lookup queries from memory but fails every
/// workload tie-break.
pub(super) struct TieBreakFailureRepository(pub(super) MemoryRepository);

impl WorkloadRepository for TieBreakFailureRepository {
    fn find_active_users_with_qualification(
        &self,
        qualification: Qualification,
    ) -> Result<Vec<User>, RepositoryError> {
        self.0.find_active_users_with_qualification(qualification)
    }

    fn find_active_users_with_role(&self, role: UserRole) -> Result<Vec<User>, RepositoryError> {
        self.0.find_active_users_with_role(role)
    }

    fn find_by_identifier(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.0.find_by_identifier(id)
    }

    fn find_user_with_least_assessments_pending_or_completed_in_last_week(
        &self,
        _candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Query("workload view missing".to_string()))
    }

    fn find_user_with_least_placement_requests_pending_or_completed_in_last_week(
        &self,
        _candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Query("workload view missing".to_string()))
    }

    fn find_user_with_least_placement_applications_pending_or_completed_in_last_week(
        &self,
        _candidates: &[UserId],
    ) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Query("workload view missing".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingReporter {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub(super) fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("reporter mutex poisoned").clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn capture_error_message(&self, message: &str) {
        self.messages
            .lock()
            .expect("reporter mutex poisoned")
            .push(message.to_string());
    }
}

pub(super) fn allocator(
    rules: Vec<Arc<dyn AllocationRule>>,
    users: Vec<User>,
) -> (
    UserAllocator<MemoryRepository, RecordingReporter>,
    Arc<RecordingReporter>,
) {
    let repository = Arc::new(MemoryRepository::with_users(users));
    let reporter = Arc::new(RecordingReporter::default());
    let allocator = UserAllocator::new(rules, repository, reporter.clone());
    (allocator, reporter)
}

#[derive(Default, Clone)]
pub(super) struct LogBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub(super) fn contents(&self) -> String {
        let bytes = self.bytes.lock().expect("log mutex poisoned").clone();
        String::from_utf8(bytes).expect("logs are utf-8")
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .expect("log mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a thread-local subscriber and returns its warn-and-above output.
pub(super) fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
