//! Shared primitive types used across the engine.

/// Identifier of a project (a sales opportunity grouping contracts).
pub type ProjectId = String;

/// Identifier of a contact (the insured person).
pub type ContactId = String;

/// Identifier of an insurance contract.
pub type ContractId = String;

/// Globally unique identifier of one calculation.
pub type CalculationId = String;

/// Identifiers attached to a work item and echoed on its result.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ItemIdentifiers {
    pub project_id:  Option<ProjectId>,
    pub contact_id:  Option<ContactId>,
    pub contract_id: Option<ContractId>,
}

impl ItemIdentifiers {
    pub fn for_contract(
        project_id: Option<ProjectId>,
        contact_id: Option<ContactId>,
        contract_id: ContractId,
    ) -> Self {
        Self {
            project_id,
            contact_id,
            contract_id: Some(contract_id),
        }
    }

    /// Best label for log lines.
    pub fn label(&self) -> &str {
        self.contract_id
            .as_deref()
            .or(self.project_id.as_deref())
            .unwrap_or("<anonymous>")
    }
}
