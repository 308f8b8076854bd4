use crate::{orchestrator::DEFAULT_BATCH_SIZE, rate_registry::RateRegistry};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Run settings, read from `{data_dir}/engine/engine_config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,
    /// Whole-run deadline; checked between chunks.
    #[serde(default)]
    pub run_deadline_secs: Option<u64>,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_batch_size: DEFAULT_BATCH_SIZE,
            run_deadline_secs:  None,
        }
    }
}

impl EngineConfig {
    /// Load from the data/ directory.
    /// In tests, use EngineConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine/engine_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        if config.default_batch_size == 0 {
            anyhow::bail!("{path}: default_batch_size must be at least 1");
        }
        Ok(config)
    }

    /// Small batches so tests exercise several chunks.
    pub fn default_test() -> Self {
        Self {
            default_batch_size: 3,
            run_deadline_secs:  None,
        }
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }
}

/// Everything loaded from a data directory for one engine instance.
#[derive(Debug, Clone)]
pub struct DataDir {
    pub engine:   EngineConfig,
    pub registry: RateRegistry,
}

impl DataDir {
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        Ok(Self {
            engine:   EngineConfig::load(data_dir)?,
            registry: RateRegistry::load(data_dir)?,
        })
    }
}
