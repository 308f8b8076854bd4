//! Rate registry: carrier commission configuration.
//!
//! RULE: The registry is built once per run and never mutated afterwards.
//! Updates go through the store's administrative path and produce a new
//! registry for the next run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Carrier-side classification of how commission is paid out.
/// Informational only: it never changes the calculation formula.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommissionType {
    Precompte,
    Linear,
}

impl CommissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precompte => "precompte",
            Self::Linear    => "linear",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "precompte" => Some(Self::Precompte),
            "linear" | "lineaire" => Some(Self::Linear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommissionConfig {
    /// Normalized carrier key (uppercase, trimmed).
    pub carrier: String,
    /// First-year commission rate, in percent (0–100).
    pub rate_year1: f64,
    /// Recurring commission rate, in percent.
    pub rate_recurring: f64,
    pub commission_type: CommissionType,
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl CommissionConfig {
    pub fn new(
        carrier: &str,
        rate_year1: f64,
        rate_recurring: f64,
        commission_type: CommissionType,
    ) -> Self {
        let now = Utc::now();
        Self {
            carrier: normalize_carrier(carrier),
            rate_year1,
            rate_recurring,
            commission_type,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RateTableFile {
    carriers: Vec<CommissionConfig>,
}

/// Uppercase + trim. Lookups are exact matches on this form.
pub fn normalize_carrier(name: &str) -> String {
    name.trim().to_uppercase()
}

#[derive(Debug, Clone, Default)]
pub struct RateRegistry {
    configs: BTreeMap<String, CommissionConfig>,
}

impl RateRegistry {
    /// Build from a list of configs. Keys are re-normalized; a later
    /// entry for the same carrier replaces an earlier one.
    pub fn from_configs(configs: impl IntoIterator<Item = CommissionConfig>) -> Self {
        let configs = configs
            .into_iter()
            .map(|mut c| {
                c.carrier = normalize_carrier(&c.carrier);
                (c.carrier.clone(), c)
            })
            .collect();
        Self { configs }
    }

    /// Load from `{data_dir}/carriers/commission_rates.json`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/carriers/commission_rates.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let file: RateTableFile = serde_json::from_str(content)?;
        for c in &file.carriers {
            if !(0.0..=100.0).contains(&c.rate_year1) || c.rate_recurring < 0.0 {
                anyhow::bail!(
                    "Carrier {} has out-of-range rates ({} / {})",
                    c.carrier,
                    c.rate_year1,
                    c.rate_recurring
                );
            }
        }
        let registry = Self::from_configs(file.carriers);
        log::debug!("registry: loaded {} carrier configs", registry.configs.len());
        Ok(registry)
    }

    /// The compiled-in rate table. Mirrors data/carriers/commission_rates.json.
    pub fn builtin() -> Self {
        use CommissionType::{Linear, Precompte};
        Self::from_configs([
            CommissionConfig::new("SPVIE", 40.0, 10.0, Precompte),
            CommissionConfig::new("APRIL", 30.0, 10.0, Precompte),
            CommissionConfig::new("ALPTIS", 35.0, 10.0, Precompte),
            CommissionConfig::new("NEOLIANE", 30.0, 12.0, Precompte),
            CommissionConfig::new("ZENIOO", 25.0, 10.0, Linear),
            CommissionConfig::new("MALAKOFF HUMANIS", 15.0, 15.0, Linear),
            CommissionConfig::new("HARMONIE MUTUELLE", 12.0, 12.0, Linear),
            CommissionConfig::new("SWISSLIFE", 20.0, 8.0, Linear),
            CommissionConfig::new("AXA", 18.0, 8.0, Linear).inactive(),
        ])
    }

    /// Active config for `carrier_name`, or None when unknown or inactive.
    pub fn lookup(&self, carrier_name: &str) -> Option<&CommissionConfig> {
        self.configs
            .get(&normalize_carrier(carrier_name))
            .filter(|c| c.active)
    }

    /// Active configs ordered by carrier key.
    pub fn list_active(&self) -> Vec<&CommissionConfig> {
        self.configs.values().filter(|c| c.active).collect()
    }

    /// Every config, active or not. Administrative use only.
    pub fn all(&self) -> impl Iterator<Item = &CommissionConfig> {
        self.configs.values()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
