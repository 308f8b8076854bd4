//! Record store contract: the engine's only window on persistence.
//!
//! The engine reads projects and contracts and writes calculation results
//! through this trait. `store::CommissionStore` is the SQLite implementation.

use crate::{
    calculation::CommissionCalculation,
    calculator::PremiumInput,
    error::CommissionResult,
    types::{ContactId, ContractId, ProjectId},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id:         ProjectId,
    pub contact_id: Option<ContactId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub id:              ContractId,
    pub project_id:      Option<ProjectId>,
    pub carrier_name:    String,
    pub monthly_premium: PremiumInput,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn read_project(&self, id: &str) -> CommissionResult<ProjectRecord>;

    async fn read_contracts_for_project(&self, id: &str) -> CommissionResult<Vec<ContractRecord>>;

    async fn read_all_project_ids(&self) -> CommissionResult<Vec<ProjectId>>;

    /// Fetch one contract. Used for work items that arrive unresolved.
    async fn read_contract(&self, id: &str) -> CommissionResult<ContractRecord>;

    /// Idempotent bulk write keyed by calculation id.
    async fn upsert_calculations(&self, results: &[CommissionCalculation]) -> CommissionResult<()>;
}
