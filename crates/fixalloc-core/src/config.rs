//! Configuration types for fixalloc

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FixallocError, FixallocResult};
use crate::policy::FitPolicy;

/// Main simulator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Engine configuration
    pub engine: EngineConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl SimulatorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> FixallocResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FixallocError::Config(format!("Failed to read config file: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| FixallocError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Policy used when a request does not name one
    pub default_policy: FitPolicy,
    /// Unit label printed after memory sizes
    pub unit: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_policy: FitPolicy::FirstFit,
            unit: "KB".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log filter directive (e.g. "info" or "fixalloc_engine=debug")
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Scenario file format (TOML)
///
/// ```toml
/// [scenario]
/// name = "textbook"
/// partitions = [100, 50, 200]
/// jobs = [40, 30]
///
/// [[steps]]
/// action = "allocate"
/// policy = "best-fit"
///
/// [[steps]]
/// action = "deallocate"
/// job = 1
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Initial state
    pub scenario: ScenarioSettings,
    /// Operations replayed in order after the initial state is built
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

impl ScenarioConfig {
    /// Load a scenario from a TOML file
    pub fn from_file(path: &Path) -> FixallocResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FixallocError::Scenario(format!("Failed to read scenario file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse a scenario from TOML text
    pub fn from_toml(content: &str) -> FixallocResult<Self> {
        toml::from_str(content)
            .map_err(|e| FixallocError::Scenario(format!("Failed to parse scenario: {}", e)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSettings {
    #[serde(default)]
    pub name: Option<String>,
    /// Policy for `allocate` steps that do not name one
    #[serde(default)]
    pub policy: Option<FitPolicy>,
    /// Partition capacities, in creation order
    #[serde(default)]
    pub partitions: Vec<u64>,
    /// Job memory requirements, in arrival order
    #[serde(default)]
    pub jobs: Vec<u64>,
}

/// A single scenario operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ScenarioStep {
    AddPartition {
        capacity: u64,
    },
    AddJob {
        memory: u64,
    },
    Allocate {
        #[serde(default)]
        policy: Option<FitPolicy>,
    },
    Deallocate {
        job: u32,
    },
    Reset,
}
