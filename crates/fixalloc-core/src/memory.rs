//! Partition, Job, and identifier type definitions

use serde::{Deserialize, Serialize};

use crate::error::{FixallocError, FixallocResult};

/// Identifier of a partition, displayed as `F<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(u32);

impl PartitionId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F{}", self.0)
    }
}

/// Identifier of a job, displayed as `J<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u32);

impl JobId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "J{}", self.0)
    }
}

/// Lifecycle of a job. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for a free partition
    Waiting,
    /// Bound to exactly one partition
    Allocated,
    /// Released; never placed again
    Finished,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Waiting => write!(f, "Waiting"),
            JobStatus::Allocated => write!(f, "Allocated"),
            JobStatus::Finished => write!(f, "Finished"),
        }
    }
}

/// A unit of work with a fixed memory requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    id: JobId,
    memory_needed: u64,
    status: JobStatus,
}

impl Job {
    /// Create a new waiting job. `memory_needed` must be positive.
    pub fn new(id: JobId, memory_needed: u64) -> FixallocResult<Self> {
        if memory_needed == 0 {
            return Err(FixallocError::InvalidArgument(format!(
                "memory needed by {} must be positive",
                id
            )));
        }

        Ok(Self {
            id,
            memory_needed,
            status: JobStatus::Waiting,
        })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn memory_needed(&self) -> u64 {
        self.memory_needed
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_waiting(&self) -> bool {
        self.status == JobStatus::Waiting
    }

    pub fn is_allocated(&self) -> bool {
        self.status == JobStatus::Allocated
    }

    /// Finish an allocated job that no partition in `partitions` holds.
    ///
    /// [`Partition::release`] is the normal path. This refuses while any
    /// partition still references the job, so it cannot leave a partition
    /// occupied by a finished job.
    pub fn release_unbound(&mut self, partitions: &[Partition]) -> FixallocResult<()> {
        if self.status != JobStatus::Allocated {
            return Err(FixallocError::NotAllocated(self.id));
        }
        if let Some(holder) = partitions.iter().find(|p| p.current_job == Some(self.id)) {
            return Err(FixallocError::InvalidArgument(format!(
                "{} is still held by {}",
                self.id, holder.id
            )));
        }
        self.status = JobStatus::Finished;
        Ok(())
    }
}

/// A fixed-size block of memory holding at most one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    id: PartitionId,
    capacity: u64,
    current_job: Option<JobId>,
    /// Memory used by the current job, 0 while free
    used: u64,
}

impl Partition {
    /// Create a new free partition. `capacity` must be positive.
    pub fn new(id: PartitionId, capacity: u64) -> FixallocResult<Self> {
        if capacity == 0 {
            return Err(FixallocError::InvalidArgument(format!(
                "capacity of {} must be positive",
                id
            )));
        }

        Ok(Self {
            id,
            capacity,
            current_job: None,
            used: 0,
        })
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn is_occupied(&self) -> bool {
        self.current_job.is_some()
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.current_job
    }

    /// Memory used by the current job
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Whether `job` could be placed here right now
    pub fn fits(&self, job: &Job) -> bool {
        !self.is_occupied() && self.capacity >= job.memory_needed
    }

    /// Space `job` would waste if placed here, or `None` if it does not fit
    pub fn waste_for(&self, job: &Job) -> Option<u64> {
        self.fits(job).then(|| self.capacity - job.memory_needed)
    }

    /// Wasted space inside the partition while occupied
    pub fn internal_fragmentation(&self) -> Option<u64> {
        self.current_job.map(|_| self.capacity - self.used)
    }

    /// Bind a waiting job to this partition and mark it allocated.
    ///
    /// Nothing is mutated when an error is returned.
    pub fn assign(&mut self, job: &mut Job) -> FixallocResult<()> {
        if job.status != JobStatus::Waiting {
            return Err(FixallocError::InvalidArgument(format!(
                "{} is {} and cannot be placed",
                job.id, job.status
            )));
        }
        if !self.fits(job) {
            return Err(FixallocError::InvalidArgument(format!(
                "{} ({}) does not fit in {}",
                job.id, job.memory_needed, self.id
            )));
        }

        self.current_job = Some(job.id);
        self.used = job.memory_needed;
        job.status = JobStatus::Allocated;
        Ok(())
    }

    /// Unbind `job` from this partition and mark it finished.
    ///
    /// Nothing is mutated when an error is returned.
    pub fn release(&mut self, job: &mut Job) -> FixallocResult<()> {
        if self.current_job != Some(job.id) || job.status != JobStatus::Allocated {
            return Err(FixallocError::NotAllocated(job.id));
        }
        job.status = JobStatus::Finished;

        self.current_job = None;
        self.used = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_partition_is_free() {
        let partition = Partition::new(PartitionId::new(1), 100).unwrap();
        assert!(!partition.is_occupied());
        assert_eq!(partition.current_job(), None);
        assert_eq!(partition.internal_fragmentation(), None);
    }

    #[test]
    fn test_new_job_is_waiting() {
        let job = Job::new(JobId::new(1), 40).unwrap();
        assert_eq!(job.status(), JobStatus::Waiting);
        assert_eq!(job.memory_needed(), 40);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(matches!(
            Partition::new(PartitionId::new(1), 0),
            Err(FixallocError::InvalidArgument(_))
        ));
        assert!(matches!(
            Job::new(JobId::new(1), 0),
            Err(FixallocError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_assign_and_release() {
        let mut partition = Partition::new(PartitionId::new(1), 100).unwrap();
        let mut job = Job::new(JobId::new(1), 40).unwrap();

        partition.assign(&mut job).unwrap();
        assert!(partition.is_occupied());
        assert_eq!(partition.current_job(), Some(JobId::new(1)));
        assert_eq!(partition.internal_fragmentation(), Some(60));
        assert_eq!(job.status(), JobStatus::Allocated);

        partition.release(&mut job).unwrap();
        assert!(!partition.is_occupied());
        assert_eq!(partition.used(), 0);
        assert_eq!(job.status(), JobStatus::Finished);
    }

    #[test]
    fn test_exact_fit_is_eligible() {
        let partition = Partition::new(PartitionId::new(1), 50).unwrap();
        let job = Job::new(JobId::new(1), 50).unwrap();
        assert_eq!(partition.waste_for(&job), Some(0));
    }

    #[test]
    fn test_assign_rejects_occupied_partition() {
        let mut partition = Partition::new(PartitionId::new(1), 100).unwrap();
        let mut first = Job::new(JobId::new(1), 10).unwrap();
        let mut second = Job::new(JobId::new(2), 10).unwrap();

        partition.assign(&mut first).unwrap();
        assert!(partition.assign(&mut second).is_err());
        assert_eq!(second.status(), JobStatus::Waiting);
        assert_eq!(partition.current_job(), Some(JobId::new(1)));
    }

    #[test]
    fn test_finished_job_cannot_be_reassigned() {
        let mut partition = Partition::new(PartitionId::new(1), 100).unwrap();
        let mut job = Job::new(JobId::new(1), 10).unwrap();
        partition.assign(&mut job).unwrap();
        partition.release(&mut job).unwrap();

        assert!(partition.assign(&mut job).is_err());
        assert!(!partition.is_occupied());
    }

    #[test]
    fn test_release_wrong_job_is_rejected() {
        let mut partition = Partition::new(PartitionId::new(1), 100).unwrap();
        let mut held = Job::new(JobId::new(1), 10).unwrap();
        let mut other = Job::new(JobId::new(2), 10).unwrap();
        partition.assign(&mut held).unwrap();

        let err = partition.release(&mut other).unwrap_err();
        assert!(matches!(err, FixallocError::NotAllocated(id) if id == JobId::new(2)));
        assert_eq!(partition.current_job(), Some(JobId::new(1)));
        assert_eq!(other.status(), JobStatus::Waiting);
    }

    #[test]
    fn test_release_unbound_refuses_held_job() {
        let mut partitions = vec![Partition::new(PartitionId::new(1), 100).unwrap()];
        let mut job = Job::new(JobId::new(1), 10).unwrap();
        partitions[0].assign(&mut job).unwrap();

        let err = job.release_unbound(&partitions).unwrap_err();
        assert!(matches!(err, FixallocError::InvalidArgument(_)));
        assert_eq!(job.status(), JobStatus::Allocated);

        // The normal release path still works and frees the partition
        partitions[0].release(&mut job).unwrap();
        assert!(!partitions[0].is_occupied());
        assert_eq!(job.status(), JobStatus::Finished);
    }

    #[test]
    fn test_release_unbound_finishes_orphaned_job() {
        let mut held_by = Partition::new(PartitionId::new(1), 100).unwrap();
        let mut job = Job::new(JobId::new(1), 10).unwrap();
        held_by.assign(&mut job).unwrap();

        let elsewhere = vec![Partition::new(PartitionId::new(2), 100).unwrap()];
        job.release_unbound(&elsewhere).unwrap();
        assert_eq!(job.status(), JobStatus::Finished);
        assert!(matches!(
            job.release_unbound(&elsewhere),
            Err(FixallocError::NotAllocated(_))
        ));
    }

    #[test]
    fn test_release_unbound_rejects_waiting_job() {
        let mut job = Job::new(JobId::new(1), 10).unwrap();
        assert!(matches!(
            job.release_unbound(&[]),
            Err(FixallocError::NotAllocated(_))
        ));
        assert!(job.is_waiting());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PartitionId::new(2).to_string(), "F2");
        assert_eq!(JobId::new(7).to_string(), "J7");
        assert_eq!(JobStatus::Allocated.to_string(), "Allocated");
    }
}
