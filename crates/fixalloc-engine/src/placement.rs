//! Placement policies for choosing a partition

use fixalloc_core::{FitPolicy, Job, Partition};
use std::cmp::Reverse;

/// Strategy for picking one eligible partition for a job
pub trait PlacementStrategy: Send + Sync {
    /// Return the index of the chosen partition, or `None` if nothing fits.
    ///
    /// `cursor` is the index of the last successful Next Fit placement.
    fn select(&self, partitions: &[Partition], job: &Job, cursor: usize) -> Option<usize>;

    /// Whether a successful placement moves the cursor
    fn tracks_cursor(&self) -> bool {
        false
    }

    /// Policy implemented by this strategy
    fn policy(&self) -> FitPolicy;
}

/// First eligible partition in creation order
pub struct FirstFit;

impl PlacementStrategy for FirstFit {
    fn select(&self, partitions: &[Partition], job: &Job, _cursor: usize) -> Option<usize> {
        partitions.iter().position(|p| p.fits(job))
    }

    fn policy(&self) -> FitPolicy {
        FitPolicy::FirstFit
    }
}

/// Eligible partition with the least waste; earliest wins ties
pub struct BestFit;

impl PlacementStrategy for BestFit {
    fn select(&self, partitions: &[Partition], job: &Job, _cursor: usize) -> Option<usize> {
        partitions
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.waste_for(job).map(|waste| (i, waste)))
            .min_by_key(|&(_, waste)| waste)
            .map(|(i, _)| i)
    }

    fn policy(&self) -> FitPolicy {
        FitPolicy::BestFit
    }
}

/// Eligible partition with the most waste; earliest wins ties
pub struct WorstFit;

impl PlacementStrategy for WorstFit {
    fn select(&self, partitions: &[Partition], job: &Job, _cursor: usize) -> Option<usize> {
        // max_by_key keeps the last maximum, so break ties on the reversed index
        partitions
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.waste_for(job).map(|waste| (i, waste)))
            .max_by_key(|&(i, waste)| (waste, Reverse(i)))
            .map(|(i, _)| i)
    }

    fn policy(&self) -> FitPolicy {
        FitPolicy::WorstFit
    }
}

/// First eligible partition after the cursor, wrapping around
pub struct NextFit;

impl PlacementStrategy for NextFit {
    fn select(&self, partitions: &[Partition], job: &Job, cursor: usize) -> Option<usize> {
        let n = partitions.len();
        if n == 0 {
            return None;
        }

        (0..n)
            .map(|step| (cursor % n + 1 + step) % n)
            .find(|&i| partitions[i].fits(job))
    }

    fn tracks_cursor(&self) -> bool {
        true
    }

    fn policy(&self) -> FitPolicy {
        FitPolicy::NextFit
    }
}

/// Strategy implementing `policy`
pub fn strategy_for(policy: FitPolicy) -> &'static dyn PlacementStrategy {
    match policy {
        FitPolicy::FirstFit => &FirstFit,
        FitPolicy::BestFit => &BestFit,
        FitPolicy::WorstFit => &WorstFit,
        FitPolicy::NextFit => &NextFit,
    }
}
