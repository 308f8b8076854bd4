//! Calculation result types.

use crate::{
    rate_registry::CommissionType,
    types::{CalculationId, ContactId, ContractId, ItemIdentifiers, ProjectId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    Calculated,
    Pending,
    Error,
}

impl CalculationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calculated => "calculated",
            Self::Pending    => "pending",
            Self::Error      => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "calculated" => Some(Self::Calculated),
            "pending"    => Some(Self::Pending),
            "error"      => Some(Self::Error),
            _ => None,
        }
    }
}

/// Diagnostic record of the parameters a successful calculation used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculationMetadata {
    pub rate_year1:     f64,
    pub rate_recurring: f64,
    pub retention_rate: f64,
    pub engine_version: String,
}

/// One contract's commission breakdown. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommissionCalculation {
    pub id:          CalculationId,
    pub project_id:  Option<ProjectId>,
    pub contact_id:  Option<ContactId>,
    pub contract_id: Option<ContractId>,
    /// Carrier name as supplied, for display.
    pub carrier_name: String,

    pub monthly_premium:          f64,
    pub annual_premium:           f64,
    pub monthly_commission:       f64,
    pub annual_commission:        f64,
    pub annual_commission_net:    f64,
    pub recurring_commission:     f64,
    pub recurring_commission_net: f64,

    pub commission_type: Option<CommissionType>,
    pub calculated_at:   DateTime<Utc>,
    pub status:          CalculationStatus,
    pub errors:          Vec<String>,
    pub metadata:        Option<CalculationMetadata>,
}

impl CommissionCalculation {
    /// An `error`-status result: fresh id, zeroed amounts, one message.
    pub fn failed(
        carrier_name: &str,
        ids: &ItemIdentifiers,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id:          new_calculation_id(),
            project_id:  ids.project_id.clone(),
            contact_id:  ids.contact_id.clone(),
            contract_id: ids.contract_id.clone(),
            carrier_name: carrier_name.to_string(),
            monthly_premium:          0.0,
            annual_premium:           0.0,
            monthly_commission:       0.0,
            annual_commission:        0.0,
            annual_commission_net:    0.0,
            recurring_commission:     0.0,
            recurring_commission_net: 0.0,
            commission_type: None,
            calculated_at:   Utc::now(),
            status:          CalculationStatus::Error,
            errors:          vec![message.into()],
            metadata:        None,
        }
    }

    pub fn is_calculated(&self) -> bool {
        self.status == CalculationStatus::Calculated
    }

    pub fn identifiers(&self) -> ItemIdentifiers {
        ItemIdentifiers {
            project_id:  self.project_id.clone(),
            contact_id:  self.contact_id.clone(),
            contract_id: self.contract_id.clone(),
        }
    }
}

pub fn new_calculation_id() -> CalculationId {
    Uuid::new_v4().to_string()
}
