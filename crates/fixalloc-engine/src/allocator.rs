//! Allocation and reclaim over caller-owned partitions and jobs

use fixalloc_core::{FitPolicy, FixallocError, FixallocResult, Job, JobId, Partition, PartitionId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::placement::strategy_for;

/// A job bound to a partition during an allocation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub job: JobId,
    pub partition: PartitionId,
    /// Position of the partition in creation order
    pub partition_index: usize,
    /// Internal fragmentation left by the placement
    pub waste: u64,
}

/// Result of one placement attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum PlacementResult {
    Placed(Placement),
    /// No free partition was large enough; the job stays waiting
    NoEligiblePartition { job: JobId, memory_needed: u64 },
}

/// Summary of an allocation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationOutcome {
    pub policy: FitPolicy,
    /// One entry per waiting job, in arrival order
    pub results: Vec<PlacementResult>,
    /// Next Fit cursor after the pass
    pub cursor: usize,
}

impl AllocationOutcome {
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.results.iter().filter_map(|r| match r {
            PlacementResult::Placed(p) => Some(p),
            PlacementResult::NoEligiblePartition { .. } => None,
        })
    }

    /// Jobs that are still waiting after the pass
    pub fn unplaced(&self) -> Vec<JobId> {
        self.results
            .iter()
            .filter_map(|r| match r {
                PlacementResult::NoEligiblePartition { job, .. } => Some(*job),
                PlacementResult::Placed(_) => None,
            })
            .collect()
    }

    pub fn placed_count(&self) -> usize {
        self.placements().count()
    }
}

/// Result of releasing a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deallocation {
    pub job: JobId,
    /// Partition that was freed; `None` if no partition referenced the job
    pub partition: Option<PartitionId>,
}

/// Place each waiting job, in order, using `policy`.
///
/// Jobs that are not waiting are skipped. Each job gets one attempt and a
/// placed job is never moved again. Only Next Fit moves the cursor; with no
/// partitions the cursor comes back unchanged.
pub fn allocate<'a, I>(
    policy: FitPolicy,
    partitions: &mut [Partition],
    waiting: I,
    mut cursor: usize,
) -> AllocationOutcome
where
    I: IntoIterator<Item = &'a mut Job>,
{
    let strategy = strategy_for(policy);
    let mut results = Vec::new();

    for job in waiting {
        if !job.is_waiting() {
            debug!(job = %job.id(), status = %job.status(), "Skipping job that is not waiting");
            continue;
        }

        let Some(index) = strategy.select(partitions, job, cursor) else {
            debug!(job = %job.id(), memory = job.memory_needed(), "No eligible partition");
            results.push(PlacementResult::NoEligiblePartition {
                job: job.id(),
                memory_needed: job.memory_needed(),
            });
            continue;
        };

        let partition = &mut partitions[index];
        if let Err(e) = partition.assign(job) {
            warn!(job = %job.id(), partition = %partition.id(), error = %e, "Placement rejected");
            results.push(PlacementResult::NoEligiblePartition {
                job: job.id(),
                memory_needed: job.memory_needed(),
            });
            continue;
        }

        if strategy.tracks_cursor() {
            cursor = index;
        }

        let placement = Placement {
            job: job.id(),
            partition: partition.id(),
            partition_index: index,
            waste: partition.capacity() - job.memory_needed(),
        };
        debug!(
            job = %placement.job,
            partition = %placement.partition,
            waste = placement.waste,
            "Job placed"
        );
        results.push(PlacementResult::Placed(placement));
    }

    let outcome = AllocationOutcome {
        policy,
        results,
        cursor,
    };

    if !outcome.results.is_empty() {
        info!(
            policy = %policy,
            placed = outcome.placed_count(),
            waiting = outcome.results.len() - outcome.placed_count(),
            cursor = outcome.cursor,
            "Allocation pass complete"
        );
    }

    outcome
}

/// Release `job` from whichever partition holds it and mark it finished.
///
/// Fails with `NotAllocated` without mutating anything if the job is not
/// allocated. A job that no partition references is still finished.
pub fn deallocate(partitions: &mut [Partition], job: &mut Job) -> FixallocResult<Deallocation> {
    if !job.is_allocated() {
        return Err(FixallocError::NotAllocated(job.id()));
    }

    let job_id = job.id();
    let holder = partitions
        .iter()
        .position(|p| p.current_job() == Some(job_id));
    let partition = match holder {
        Some(index) => {
            let partition = &mut partitions[index];
            partition.release(job)?;
            Some(partition.id())
        }
        None => {
            warn!(job = %job_id, "No partition references job; finishing it anyway");
            job.release_unbound(partitions)?;
            None
        }
    };

    info!(
        job = %job_id,
        partition = ?partition.map(|p| p.to_string()),
        "Job deallocated"
    );

    Ok(Deallocation {
        job: job_id,
        partition,
    })
}
