//! Simulation session owning partitions, jobs, id counters and the cursor

use fixalloc_core::{
    EngineConfig, FitPolicy, FixallocError, FixallocResult, Job, JobId, JobStatus, Partition,
    PartitionId,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::allocator::{self, AllocationOutcome, Deallocation};
use crate::snapshot::{MemoryStats, SessionSnapshot};

/// Session state for one simulation run.
///
/// The job roster is the only owner of jobs. Partitions refer to jobs by id,
/// and the waiting/allocated/finished lists are computed from job status on
/// demand. [`Session::reset`] returns the session to its initial state: no
/// entities, counters at 0 (next id is 1) and the Next Fit cursor at 0.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Partitions in creation order
    partitions: Vec<Partition>,
    /// Jobs keyed by id; ids are sequential so this is arrival order
    jobs: BTreeMap<JobId, Job>,
    /// Last partition id handed out
    partition_counter: u32,
    /// Last job id handed out
    job_counter: u32,
    /// Index of the last Next Fit placement
    cursor: usize,
    default_policy: FitPolicy,
}

impl Session {
    /// Create an empty session using First Fit by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session from engine configuration
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            default_policy: config.default_policy,
            ..Self::default()
        }
    }

    pub fn default_policy(&self) -> FitPolicy {
        self.default_policy
    }

    /// Add a partition with the next sequential id
    pub fn create_partition(&mut self, capacity: u64) -> FixallocResult<PartitionId> {
        let id = PartitionId::new(self.partition_counter + 1);
        let partition = Partition::new(id, capacity)?;

        self.partition_counter += 1;
        self.partitions.push(partition);
        debug!(partition = %id, capacity, "Partition created");
        Ok(id)
    }

    /// Add a waiting job with the next sequential id
    pub fn create_job(&mut self, memory_needed: u64) -> FixallocResult<JobId> {
        let id = JobId::new(self.job_counter + 1);
        let job = Job::new(id, memory_needed)?;

        self.job_counter += 1;
        self.jobs.insert(id, job);
        debug!(job = %id, memory_needed, "Job created");
        Ok(id)
    }

    /// Run one allocation pass over all waiting jobs
    pub fn allocate(&mut self, policy: FitPolicy) -> AllocationOutcome {
        let waiting = self.jobs.values_mut().filter(|job| job.is_waiting());
        let outcome = allocator::allocate(policy, &mut self.partitions, waiting, self.cursor);
        self.cursor = outcome.cursor;
        outcome
    }

    /// Run one allocation pass with the session's default policy
    pub fn allocate_default(&mut self) -> AllocationOutcome {
        self.allocate(self.default_policy)
    }

    /// Release an allocated job and free its partition
    pub fn deallocate(&mut self, job_id: JobId) -> FixallocResult<Deallocation> {
        let job = self
            .jobs
            .get_mut(&job_id)
            .ok_or(FixallocError::JobNotFound(job_id))?;
        allocator::deallocate(&mut self.partitions, job)
    }

    /// Discard every entity and reset the counters and cursor
    pub fn reset(&mut self) {
        info!(
            partitions = self.partitions.len(),
            jobs = self.jobs.len(),
            "Session reset"
        );
        self.partitions.clear();
        self.jobs.clear();
        self.partition_counter = 0;
        self.job_counter = 0;
        self.cursor = 0;
    }

    /// Next Fit cursor
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn partition(&self, id: PartitionId) -> FixallocResult<&Partition> {
        self.partitions
            .iter()
            .find(|p| p.id() == id)
            .ok_or(FixallocError::PartitionNotFound(id))
    }

    /// All jobs in arrival order
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn job(&self, id: JobId) -> FixallocResult<&Job> {
        self.jobs.get(&id).ok_or(FixallocError::JobNotFound(id))
    }

    /// Jobs with `status`, in arrival order
    pub fn jobs_with_status(&self, status: JobStatus) -> Vec<&Job> {
        self.jobs.values().filter(|j| j.status() == status).collect()
    }

    pub fn waiting_jobs(&self) -> Vec<&Job> {
        self.jobs_with_status(JobStatus::Waiting)
    }

    pub fn allocated_jobs(&self) -> Vec<&Job> {
        self.jobs_with_status(JobStatus::Allocated)
    }

    pub fn finished_jobs(&self) -> Vec<&Job> {
        self.jobs_with_status(JobStatus::Finished)
    }

    /// Partition currently holding `job_id`, if any
    pub fn partition_of(&self, job_id: JobId) -> Option<&Partition> {
        self.partitions
            .iter()
            .find(|p| p.current_job() == Some(job_id))
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats::collect(&self.partitions, self.jobs.values())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.partitions, self.jobs.values(), self.cursor)
    }
}
