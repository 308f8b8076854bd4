use super::CommissionStore;
use crate::{
    calculator::PremiumInput,
    error::CommissionResult,
    gateway::{ContractRecord, ProjectRecord},
    types::ProjectId,
};
use rusqlite::{params, types::Value, OptionalExtension};

fn premium_to_value(premium: &PremiumInput) -> Value {
    match premium {
        PremiumInput::Amount(v) => Value::Real(*v),
        PremiumInput::Text(s) => Value::Text(s.clone()),
    }
}

fn premium_from_value(value: Value) -> PremiumInput {
    match value {
        Value::Real(v) => PremiumInput::Amount(v),
        Value::Integer(v) => PremiumInput::Amount(v as f64),
        Value::Text(s) => PremiumInput::Text(s),
        // NULL and blobs fail validation downstream as unparseable text.
        Value::Null => PremiumInput::Text(String::new()),
        Value::Blob(b) => PremiumInput::Text(String::from_utf8_lossy(&b).into_owned()),
    }
}

fn contract_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContractRecord> {
    Ok(ContractRecord {
        id:              row.get(0)?,
        project_id:      row.get(1)?,
        carrier_name:    row.get(2)?,
        monthly_premium: premium_from_value(row.get(3)?),
    })
}

impl CommissionStore {
    // ── Projects ───────────────────────────────────────────────

    pub fn insert_project(&self, project: &ProjectRecord) -> CommissionResult<()> {
        self.conn()?.execute(
            "INSERT INTO project (id, contact_id) VALUES (?1, ?2)",
            params![project.id, project.contact_id],
        )?;
        Ok(())
    }

    pub fn project(&self, id: &str) -> CommissionResult<Option<ProjectRecord>> {
        let project = self
            .conn()?
            .query_row(
                "SELECT id, contact_id FROM project WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ProjectRecord {
                        id:         row.get(0)?,
                        contact_id: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(project)
    }

    pub fn project_ids(&self) -> CommissionResult<Vec<ProjectId>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM project ORDER BY id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    // ── Contracts ──────────────────────────────────────────────

    pub fn insert_contract(&self, contract: &ContractRecord) -> CommissionResult<()> {
        self.conn()?.execute(
            "INSERT INTO contract (id, project_id, carrier_name, monthly_premium)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                contract.id,
                contract.project_id,
                contract.carrier_name,
                premium_to_value(&contract.monthly_premium),
            ],
        )?;
        Ok(())
    }

    pub fn contract(&self, id: &str) -> CommissionResult<Option<ContractRecord>> {
        let contract = self
            .conn()?
            .query_row(
                "SELECT id, project_id, carrier_name, monthly_premium
                 FROM contract WHERE id = ?1",
                params![id],
                contract_from_row,
            )
            .optional()?;
        Ok(contract)
    }

    pub fn contracts_for_project(&self, project_id: &str) -> CommissionResult<Vec<ContractRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, carrier_name, monthly_premium
             FROM contract WHERE project_id = ?1
             ORDER BY id ASC",
        )?;
        let contracts = stmt
            .query_map(params![project_id], contract_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contracts)
    }
}
