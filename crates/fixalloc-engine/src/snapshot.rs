//! Read-only views of session state for rendering and reporting

use fixalloc_core::{Job, JobId, JobStatus, Partition, PartitionId};
use serde::Serialize;

/// Point-in-time copy of partitions and jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub partitions: Vec<PartitionView>,
    pub jobs: Vec<JobView>,
    pub cursor: usize,
    pub stats: MemoryStats,
}

/// Partition row with its occupant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionView {
    pub id: PartitionId,
    pub capacity: u64,
    pub occupied: bool,
    pub job: Option<JobId>,
    pub used: u64,
    pub internal_fragmentation: Option<u64>,
}

/// Job row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub memory_needed: u64,
    pub status: JobStatus,
    pub partition: Option<PartitionId>,
}

impl SessionSnapshot {
    pub fn capture<'a>(
        partitions: &[Partition],
        jobs: impl Iterator<Item = &'a Job> + Clone,
        cursor: usize,
    ) -> Self {
        let partition_views = partitions
            .iter()
            .map(|p| PartitionView {
                id: p.id(),
                capacity: p.capacity(),
                occupied: p.is_occupied(),
                job: p.current_job(),
                used: p.used(),
                internal_fragmentation: p.internal_fragmentation(),
            })
            .collect();

        let job_views = jobs
            .clone()
            .map(|j| JobView {
                id: j.id(),
                memory_needed: j.memory_needed(),
                status: j.status(),
                partition: partitions
                    .iter()
                    .find(|p| p.current_job() == Some(j.id()))
                    .map(Partition::id),
            })
            .collect();

        Self {
            partitions: partition_views,
            jobs: job_views,
            cursor,
            stats: MemoryStats::collect(partitions, jobs),
        }
    }
}

/// Aggregate memory and job counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub total_capacity: u64,
    pub allocated_memory: u64,
    /// Sum of `capacity - used` over occupied partitions
    pub internal_fragmentation: u64,
    /// Capacity of free partitions
    pub free_memory: u64,
    pub partitions: usize,
    pub free_partitions: usize,
    pub waiting_jobs: usize,
    pub allocated_jobs: usize,
    pub finished_jobs: usize,
}

impl MemoryStats {
    pub fn collect<'a>(partitions: &[Partition], jobs: impl Iterator<Item = &'a Job>) -> Self {
        let mut stats = MemoryStats {
            partitions: partitions.len(),
            ..Default::default()
        };

        for partition in partitions {
            stats.total_capacity += partition.capacity();
            match partition.internal_fragmentation() {
                Some(waste) => {
                    stats.allocated_memory += partition.used();
                    stats.internal_fragmentation += waste;
                }
                None => {
                    stats.free_memory += partition.capacity();
                    stats.free_partitions += 1;
                }
            }
        }

        for job in jobs {
            match job.status() {
                JobStatus::Waiting => stats.waiting_jobs += 1,
                JobStatus::Allocated => stats.allocated_jobs += 1,
                JobStatus::Finished => stats.finished_jobs += 1,
            }
        }

        stats
    }

    /// Share of total capacity used by jobs, in percent
    pub fn utilization(&self) -> f64 {
        if self.total_capacity == 0 {
            0.0
        } else {
            self.allocated_memory as f64 * 100.0 / self.total_capacity as f64
        }
    }
}
