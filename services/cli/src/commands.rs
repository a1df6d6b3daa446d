use std::path::PathBuf;
use std::sync::Arc;

use case_allocation::allocation::{
    AllocationDecision, TracingErrorReporter, UserAllocator, WorkItem, WorkloadImporter,
    WorkloadSnapshot,
};
use case_allocation::config::AppConfig;
use case_allocation::error::AppError;
use chrono::{DateTime, Utc};
use clap::Args;
use tracing::info;

use crate::infra::{load_roster, load_rules, load_work_item};

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    /// JSON array of users with roles, qualifications, and active status
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Workload CSV export (Kind, Allocated To, Created At, Completed At)
    #[arg(long)]
    pub(crate) workload: PathBuf,
    /// JSON work item to allocate, tagged by `kind`
    #[arg(long)]
    pub(crate) work_item: PathBuf,
    /// Rule set JSON (defaults to ALLOCATION_RULES_PATH, then the standard rules)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Reference time for workload counting (RFC 3339, defaults to now)
    #[arg(long, value_parser = crate::infra::parse_timestamp)]
    pub(crate) as_of: Option<DateTime<Utc>>,
    /// Print the decision as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RulesArgs {
    /// Rule set JSON (defaults to ALLOCATION_RULES_PATH, then the standard rules)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

pub(crate) fn run_allocate(args: AllocateArgs, config: &AppConfig) -> Result<(), AppError> {
    let AllocateArgs {
        roster,
        workload,
        work_item,
        rules,
        as_of,
        json,
    } = args;

    let rules = load_rules(rules.as_deref().or(config.allocation.rules_path.as_deref()))?;
    let users = load_roster(&roster)?;
    let entries = WorkloadImporter::from_path(&workload)?;
    let item = load_work_item(&work_item)?;

    let snapshot = Arc::new(
        WorkloadSnapshot::new(users, entries)
            .with_reference_time(as_of.unwrap_or_else(Utc::now))
            .with_lookback(config.allocation.lookback()),
    );
    let allocator = UserAllocator::new(rules, snapshot.clone(), Arc::new(TracingErrorReporter));

    info!(
        kind = item.kind().label(),
        work_item = item.id(),
        "allocating work item"
    );
    let decision = allocator.decide(&item)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        render_decision(&item, &decision, &snapshot);
    }

    Ok(())
}

pub(crate) fn run_rules(args: RulesArgs, config: &AppConfig) -> Result<(), AppError> {
    let path = args
        .rules
        .as_deref()
        .or(config.allocation.rules_path.as_deref());
    let rules = load_rules(path)?;

    match path {
        Some(path) => println!("Rule evaluation order ({})", path.display()),
        None => println!("Rule evaluation order (standard rules)"),
    }

    let allocator = UserAllocator::new(
        rules,
        Arc::new(WorkloadSnapshot::new(Vec::new(), Vec::new())),
        Arc::new(TracingErrorReporter),
    );
    for (position, (name, priority)) in allocator.rule_order().into_iter().enumerate() {
        println!("{:>2}. {} (priority {})", position + 1, name, priority);
    }

    Ok(())
}

fn render_decision(item: &WorkItem, decision: &AllocationDecision, snapshot: &WorkloadSnapshot) {
    let application = item.application();
    println!(
        "Allocation for {} {} (CRN {})",
        item.kind().label(),
        item.id(),
        application.crn
    );
    println!("- Workload as of {}", snapshot.as_of().to_rfc3339());
    println!("- {}", decision.summary());

    if let Some(user) = &decision.user {
        println!(
            "- Current {} load for {}: {}",
            item.kind().label(),
            user.id,
            snapshot.load_for(&user.id, item.kind())
        );
    }
}
