//! Placement policies

use serde::{Deserialize, Serialize};

use crate::error::FixallocError;

/// Rule used to pick a partition among the eligible ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitPolicy {
    /// First eligible partition in creation order
    #[default]
    FirstFit,
    /// Eligible partition with the least leftover space
    BestFit,
    /// Eligible partition with the most leftover space
    WorstFit,
    /// First eligible partition after the last placement, wrapping around
    NextFit,
}

impl FitPolicy {
    /// All policies, in the order they are usually presented
    pub const ALL: [FitPolicy; 4] = [
        FitPolicy::FirstFit,
        FitPolicy::BestFit,
        FitPolicy::WorstFit,
        FitPolicy::NextFit,
    ];

    /// Kebab-case name, as used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            FitPolicy::FirstFit => "first-fit",
            FitPolicy::BestFit => "best-fit",
            FitPolicy::WorstFit => "worst-fit",
            FitPolicy::NextFit => "next-fit",
        }
    }
}

impl std::fmt::Display for FitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitPolicy::FirstFit => write!(f, "First Fit"),
            FitPolicy::BestFit => write!(f, "Best Fit"),
            FitPolicy::WorstFit => write!(f, "Worst Fit"),
            FitPolicy::NextFit => write!(f, "Next Fit"),
        }
    }
}

impl std::str::FromStr for FitPolicy {
    type Err = FixallocError;

    /// Accepts `first-fit`, `first_fit`, `First Fit` and `firstfit` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "firstfit" => Ok(FitPolicy::FirstFit),
            "bestfit" => Ok(FitPolicy::BestFit),
            "worstfit" => Ok(FitPolicy::WorstFit),
            "nextfit" => Ok(FitPolicy::NextFit),
            _ => Err(FixallocError::InvalidArgument(format!(
                "unknown placement policy: {}",
                s
            ))),
        }
    }
}
