//! CLI commands implementation

use anyhow::Result;
use fixalloc_core::{
    FitPolicy, FixallocResult, JobId, ScenarioConfig, ScenarioStep, SimulatorConfig,
};
use fixalloc_engine::{
    AllocationOutcome, Deallocation, MemoryStats, PlacementResult, Session, SessionSnapshot,
};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Load the simulator configuration, falling back to defaults
pub fn load_config(path: Option<&Path>) -> Result<SimulatorConfig> {
    match path {
        Some(path) => Ok(SimulatorConfig::from_file(path)?),
        None => Ok(SimulatorConfig::default()),
    }
}

/// What happened during one replayed step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum StepEvent {
    PartitionCreated { id: String, capacity: u64 },
    JobCreated { id: String, memory: u64 },
    Allocated(AllocationOutcome),
    Deallocated(Deallocation),
    Reset,
    /// The step failed and was skipped
    Rejected { reason: String },
}

/// Session state after a scenario has been replayed
pub struct Replay {
    pub session: Session,
    pub events: Vec<StepEvent>,
}

/// Build the scenario's initial state, then apply each step in order.
///
/// With no steps a single allocation pass is run. `policy_override` replaces
/// the policy of every allocation step. A failing step is recorded as
/// [`StepEvent::Rejected`] and the replay continues.
pub fn replay(
    scenario: &ScenarioConfig,
    default_policy: FitPolicy,
    policy_override: Option<FitPolicy>,
) -> Replay {
    let mut session = Session::new();
    let mut events = Vec::new();
    let scenario_policy = scenario.scenario.policy.unwrap_or(default_policy);

    let initial = scenario
        .scenario
        .partitions
        .iter()
        .map(|&capacity| ScenarioStep::AddPartition { capacity })
        .chain(
            scenario
                .scenario
                .jobs
                .iter()
                .map(|&memory| ScenarioStep::AddJob { memory }),
        );

    let steps: Vec<ScenarioStep> = if scenario.steps.is_empty() {
        initial
            .chain(std::iter::once(ScenarioStep::Allocate { policy: None }))
            .collect()
    } else {
        initial.chain(scenario.steps.iter().cloned()).collect()
    };

    for step in &steps {
        let event = match apply(&mut session, step, scenario_policy, policy_override) {
            Ok(event) => event,
            Err(e) => {
                warn!(step = ?step, error = %e, "Scenario step rejected");
                StepEvent::Rejected {
                    reason: e.to_string(),
                }
            }
        };
        events.push(event);
    }

    info!(
        scenario = scenario.scenario.name.as_deref().unwrap_or("unnamed"),
        steps = steps.len(),
        "Scenario replayed"
    );

    Replay { session, events }
}

fn apply(
    session: &mut Session,
    step: &ScenarioStep,
    scenario_policy: FitPolicy,
    policy_override: Option<FitPolicy>,
) -> FixallocResult<StepEvent> {
    let event = match *step {
        ScenarioStep::AddPartition { capacity } => {
            let id = session.create_partition(capacity)?;
            StepEvent::PartitionCreated {
                id: id.to_string(),
                capacity,
            }
        }
        ScenarioStep::AddJob { memory } => {
            let id = session.create_job(memory)?;
            StepEvent::JobCreated {
                id: id.to_string(),
                memory,
            }
        }
        ScenarioStep::Allocate { policy } => {
            let policy = policy_override.or(policy).unwrap_or(scenario_policy);
            StepEvent::Allocated(session.allocate(policy))
        }
        ScenarioStep::Deallocate { job } => {
            StepEvent::Deallocated(session.deallocate(JobId::new(job))?)
        }
        ScenarioStep::Reset => {
            session.reset();
            StepEvent::Reset
        }
    };
    Ok(event)
}

/// Replay a scenario and print the final state
pub fn run(
    config: &SimulatorConfig,
    path: &Path,
    policy: Option<FitPolicy>,
    json: bool,
) -> Result<()> {
    let scenario = ScenarioConfig::from_file(path)?;
    let replay = replay(&scenario, config.engine.default_policy, policy);
    let snapshot = replay.session.snapshot();

    if json {
        #[derive(Serialize)]
        struct RunOutput<'a> {
            events: &'a [StepEvent],
            state: &'a SessionSnapshot,
        }

        let output = RunOutput {
            events: &replay.events,
            state: &snapshot,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let unit = &config.engine.unit;
    if let Some(name) = &scenario.scenario.name {
        println!("Scenario: {}", name);
        println!();
    }
    for line in replay.events.iter().filter_map(|e| describe_event(e, unit)) {
        println!("{}", line);
    }
    println!();
    print!("{}", render_partitions(&snapshot, unit));
    println!();
    print!("{}", render_jobs(&snapshot, unit));
    println!();
    print!("{}", render_stats(&snapshot.stats, unit));

    Ok(())
}

/// One row of a policy comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub policy: FitPolicy,
    pub stats: MemoryStats,
    /// Jobs that never found a partition during the replay
    pub rejected_placements: usize,
}

/// Replay the scenario once per policy
pub fn compare_policies(scenario: &ScenarioConfig) -> Vec<ComparisonRow> {
    FitPolicy::ALL
        .iter()
        .map(|&policy| {
            let replay = replay(scenario, policy, Some(policy));
            let rejected_placements = replay
                .events
                .iter()
                .filter_map(|e| match e {
                    StepEvent::Allocated(outcome) => Some(outcome.unplaced().len()),
                    _ => None,
                })
                .sum();
            ComparisonRow {
                policy,
                stats: replay.session.stats(),
                rejected_placements,
            }
        })
        .collect()
}

/// Replay a scenario under every policy and print a comparison table
pub fn compare(config: &SimulatorConfig, path: &Path, json: bool) -> Result<()> {
    let scenario = ScenarioConfig::from_file(path)?;
    let rows = compare_policies(&scenario);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let unit = &config.engine.unit;
    println!(
        "{:<10} {:>9} {:>8} {:>9} {:>12} {:>14} {:>12}",
        "POLICY", "ALLOCATED", "WAITING", "FINISHED", "USED", "FRAGMENTATION", "UTILIZATION"
    );
    for row in &rows {
        println!(
            "{:<10} {:>9} {:>8} {:>9} {:>12} {:>14} {:>11.1}%",
            row.policy.to_string(),
            row.stats.allocated_jobs,
            row.stats.waiting_jobs,
            row.stats.finished_jobs,
            format!("{} {}", row.stats.allocated_memory, unit),
            format!("{} {}", row.stats.internal_fragmentation, unit),
            row.stats.utilization(),
        );
    }

    Ok(())
}

/// Print the available policies
pub fn policies(config: &SimulatorConfig) {
    for policy in FitPolicy::ALL {
        let marker = if policy == config.engine.default_policy {
            " (default)"
        } else {
            ""
        };
        println!("{:<10} {}{}", policy.as_str(), policy, marker);
    }
}

fn describe_event(event: &StepEvent, unit: &str) -> Option<String> {
    match event {
        StepEvent::PartitionCreated { .. } | StepEvent::JobCreated { .. } => None,
        StepEvent::Allocated(outcome) => {
            if outcome.results.is_empty() {
                return Some(format!("{}: no waiting jobs", outcome.policy));
            }
            let parts: Vec<String> = outcome
                .results
                .iter()
                .map(|r| match r {
                    PlacementResult::Placed(p) => {
                        format!("{} -> {} (waste {} {})", p.job, p.partition, p.waste, unit)
                    }
                    PlacementResult::NoEligiblePartition { job, .. } => {
                        format!("{} waiting, no partition available", job)
                    }
                })
                .collect();
            Some(format!("{}: {}", outcome.policy, parts.join("; ")))
        }
        StepEvent::Deallocated(d) => Some(match d.partition {
            Some(partition) => format!("Deallocated {} from {}", d.job, partition),
            None => format!("Deallocated {}", d.job),
        }),
        StepEvent::Reset => Some("Reset".to_string()),
        StepEvent::Rejected { reason } => Some(format!("Rejected: {}", reason)),
    }
}

/// Partition table: one row per partition with its occupant
pub fn render_partitions(snapshot: &SessionSnapshot, unit: &str) -> String {
    let mut out = format!("{:<16} {:<16} {:>14}\n", "PARTITION", "ALLOCATED JOB", "FRAGMENTATION");
    for p in &snapshot.partitions {
        let job = p
            .job
            .map(|id| format!("{} ({} {})", id, p.used, unit))
            .unwrap_or_default();
        let waste = p
            .internal_fragmentation
            .map(|w| format!("{} {}", w, unit))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<16} {:<16} {:>14}\n",
            format!("{} ({} {})", p.id, p.capacity, unit),
            job,
            waste
        ));
    }
    out
}

/// Job table: one row per job with its status
pub fn render_jobs(snapshot: &SessionSnapshot, unit: &str) -> String {
    let mut out = format!("{:<6} {:>12} {:<10} {:<9}\n", "JOB", "MEMORY", "STATUS", "PARTITION");
    for j in &snapshot.jobs {
        out.push_str(&format!(
            "{:<6} {:>12} {:<10} {:<9}\n",
            j.id.to_string(),
            format!("{} {}", j.memory_needed, unit),
            j.status.to_string(),
            j.partition.map(|p| p.to_string()).unwrap_or_default()
        ));
    }
    out
}

fn render_stats(stats: &MemoryStats, unit: &str) -> String {
    format!(
        "Total capacity: {total} {unit}\n\
         Allocated: {used} {unit} ({util:.1}%)\n\
         Internal fragmentation: {waste} {unit}\n\
         Free partitions: {free}/{parts} ({free_mem} {unit})\n\
         Jobs: {waiting} waiting, {allocated} allocated, {finished} finished\n",
        total = stats.total_capacity,
        used = stats.allocated_memory,
        util = stats.utilization(),
        waste = stats.internal_fragmentation,
        free = stats.free_partitions,
        parts = stats.partitions,
        free_mem = stats.free_memory,
        waiting = stats.waiting_jobs,
        allocated = stats.allocated_jobs,
        finished = stats.finished_jobs,
        unit = unit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixalloc_core::JobStatus;
    use std::io::Write;

    const TEXTBOOK: &str = r#"
[scenario]
name = "textbook"
partitions = [100, 50, 200]
jobs = [40, 30]
"#;

    #[test]
    fn test_replay_without_steps_allocates_once() {
        let scenario = ScenarioConfig::from_toml(TEXTBOOK).unwrap();
        let replay = replay(&scenario, FitPolicy::FirstFit, None);

        let snapshot = replay.session.snapshot();
        let holders: Vec<Option<u32>> = snapshot
            .partitions
            .iter()
            .map(|p| p.job.map(|j| j.get()))
            .collect();
        assert_eq!(holders, vec![Some(1), Some(2), None]);
        assert!(matches!(replay.events.last(), Some(StepEvent::Allocated(_))));
    }

    #[test]
    fn test_replay_policy_precedence() {
        let scenario = ScenarioConfig::from_toml(
            r#"
[scenario]
policy = "worst-fit"
partitions = [100, 50, 200]
jobs = [40]

[[steps]]
action = "allocate"
"#,
        )
        .unwrap();

        let by_scenario = replay(&scenario, FitPolicy::FirstFit, None);
        assert_eq!(
            by_scenario.session.partition_of(JobId::new(1)).map(|p| p.capacity()),
            Some(200)
        );

        let overridden = replay(&scenario, FitPolicy::FirstFit, Some(FitPolicy::BestFit));
        assert_eq!(
            overridden.session.partition_of(JobId::new(1)).map(|p| p.capacity()),
            Some(50)
        );
    }

    #[test]
    fn test_replay_records_rejected_steps() {
        let scenario = ScenarioConfig::from_toml(
            r#"
[scenario]
partitions = [100]
jobs = [40]

[[steps]]
action = "deallocate"
job = 1

[[steps]]
action = "add-job"
memory = 0

[[steps]]
action = "allocate"

[[steps]]
action = "deallocate"
job = 1
"#,
        )
        .unwrap();

        let replay = replay(&scenario, FitPolicy::FirstFit, None);
        let rejected = replay
            .events
            .iter()
            .filter(|e| matches!(e, StepEvent::Rejected { .. }))
            .count();
        assert_eq!(rejected, 2);
        assert_eq!(
            replay.session.job(JobId::new(1)).unwrap().status(),
            JobStatus::Finished
        );
    }

    #[test]
    fn test_replay_reset_restarts_ids() {
        let scenario = ScenarioConfig::from_toml(
            r#"
[scenario]
partitions = [100]
jobs = [40, 50]

[[steps]]
action = "reset"

[[steps]]
action = "add-job"
memory = 10
"#,
        )
        .unwrap();

        let replay = replay(&scenario, FitPolicy::FirstFit, None);
        let jobs: Vec<u32> = replay.session.jobs().map(|j| j.id().get()).collect();
        assert_eq!(jobs, vec![1]);
        assert!(replay.session.partitions().is_empty());
    }

    #[test]
    fn test_compare_policies() {
        let scenario = ScenarioConfig::from_toml(
            r#"
[scenario]
partitions = [100, 50, 200]
jobs = [40, 150, 90]
"#,
        )
        .unwrap();

        let rows = compare_policies(&scenario);
        assert_eq!(rows.len(), 4);

        // Best Fit leaves room for every job; Worst Fit strands the 150 job
        let best = rows.iter().find(|r| r.policy == FitPolicy::BestFit).unwrap();
        assert_eq!(best.stats.allocated_jobs, 3);
        let worst = rows.iter().find(|r| r.policy == FitPolicy::WorstFit).unwrap();
        assert_eq!(worst.stats.waiting_jobs, 1);
        assert_eq!(worst.rejected_placements, 1);
    }

    #[test]
    fn test_render_tables() {
        let scenario = ScenarioConfig::from_toml(TEXTBOOK).unwrap();
        let snapshot = replay(&scenario, FitPolicy::FirstFit, None).session.snapshot();

        let partitions = render_partitions(&snapshot, "KB");
        assert!(partitions.contains("F1 (100 KB)"));
        assert!(partitions.contains("J1 (40 KB)"));
        assert!(partitions.contains("60 KB"));

        let jobs = render_jobs(&snapshot, "KB");
        assert!(jobs.contains("Allocated"));
        assert!(render_stats(&snapshot.stats, "KB").contains("Total capacity: 350 KB"));
    }

    #[test]
    fn test_run_reads_scenario_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", TEXTBOOK).unwrap();

        let config = SimulatorConfig::default();
        run(&config, file.path(), Some(FitPolicy::NextFit), true).unwrap();
        assert!(run(&config, Path::new("/nonexistent/scenario.toml"), None, false).is_err());
    }

    #[test]
    fn test_load_config_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.engine.default_policy, FitPolicy::FirstFit);
    }
}
