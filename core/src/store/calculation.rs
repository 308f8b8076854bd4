use super::CommissionStore;
use crate::{
    calculation::{CalculationMetadata, CalculationStatus, CommissionCalculation},
    error::{CommissionError, CommissionResult},
    rate_registry::CommissionType,
};
use chrono::{DateTime, Utc};
use rusqlite::params;

/// Raw column values; JSON and enum columns are decoded after the query.
struct CalculationRow {
    id:                       String,
    project_id:               Option<String>,
    contact_id:               Option<String>,
    contract_id:              Option<String>,
    carrier_name:             String,
    monthly_premium:          f64,
    annual_premium:           f64,
    monthly_commission:       f64,
    annual_commission:        f64,
    annual_commission_net:    f64,
    recurring_commission:     f64,
    recurring_commission_net: f64,
    commission_type:          Option<String>,
    calculated_at:            DateTime<Utc>,
    status:                   String,
    errors:                   String,
    metadata:                 Option<String>,
}

impl CalculationRow {
    fn decode(self) -> CommissionResult<CommissionCalculation> {
        let status = CalculationStatus::parse(&self.status).ok_or_else(|| {
            CommissionError::Persistence(format!(
                "calculation {} has unknown status '{}'",
                self.id, self.status
            ))
        })?;
        let errors: Vec<String> = serde_json::from_str(&self.errors)?;
        let metadata: Option<CalculationMetadata> = match &self.metadata {
            Some(json) => Some(serde_json::from_str(json)?),
            None => None,
        };
        Ok(CommissionCalculation {
            id:          self.id,
            project_id:  self.project_id,
            contact_id:  self.contact_id,
            contract_id: self.contract_id,
            carrier_name: self.carrier_name,
            monthly_premium:          self.monthly_premium,
            annual_premium:           self.annual_premium,
            monthly_commission:       self.monthly_commission,
            annual_commission:        self.annual_commission,
            annual_commission_net:    self.annual_commission_net,
            recurring_commission:     self.recurring_commission,
            recurring_commission_net: self.recurring_commission_net,
            commission_type: self.commission_type.as_deref().and_then(CommissionType::parse),
            calculated_at:   self.calculated_at,
            status,
            errors,
            metadata,
        })
    }
}

impl CommissionStore {
    /// Write results in one transaction. An existing row with the same
    /// calculation id is replaced; nothing is deduplicated by content.
    pub fn upsert_calculation_rows(&self, results: &[CommissionCalculation]) -> CommissionResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO commission_calculation (
                    id, project_id, contact_id, contract_id, carrier_name,
                    monthly_premium, annual_premium, monthly_commission,
                    annual_commission, annual_commission_net,
                    recurring_commission, recurring_commission_net,
                    commission_type, calculated_at, status, errors, metadata
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;
            for r in results {
                let errors = serde_json::to_string(&r.errors)?;
                let metadata = r.metadata.as_ref().map(serde_json::to_string).transpose()?;
                stmt.execute(params![
                    r.id,
                    r.project_id,
                    r.contact_id,
                    r.contract_id,
                    r.carrier_name,
                    r.monthly_premium,
                    r.annual_premium,
                    r.monthly_commission,
                    r.annual_commission,
                    r.annual_commission_net,
                    r.recurring_commission,
                    r.recurring_commission_net,
                    r.commission_type.map(|t| t.as_str()),
                    r.calculated_at,
                    r.status.as_str(),
                    errors,
                    metadata,
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("store: upserted {} calculations", results.len());
        Ok(())
    }

    /// All stored results, optionally limited to one project.
    pub fn read_calculations(&self, project_id: Option<&str>) -> CommissionResult<Vec<CommissionCalculation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, contact_id, contract_id, carrier_name,
                    monthly_premium, annual_premium, monthly_commission,
                    annual_commission, annual_commission_net,
                    recurring_commission, recurring_commission_net,
                    commission_type, calculated_at, status, errors, metadata
             FROM commission_calculation
             WHERE ?1 IS NULL OR project_id = ?1
             ORDER BY calculated_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(CalculationRow {
                    id:                       row.get(0)?,
                    project_id:               row.get(1)?,
                    contact_id:               row.get(2)?,
                    contract_id:              row.get(3)?,
                    carrier_name:             row.get(4)?,
                    monthly_premium:          row.get(5)?,
                    annual_premium:           row.get(6)?,
                    monthly_commission:       row.get(7)?,
                    annual_commission:        row.get(8)?,
                    annual_commission_net:    row.get(9)?,
                    recurring_commission:     row.get(10)?,
                    recurring_commission_net: row.get(11)?,
                    commission_type:          row.get(12)?,
                    calculated_at:            row.get(13)?,
                    status:                   row.get(14)?,
                    errors:                   row.get(15)?,
                    metadata:                 row.get(16)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(CalculationRow::decode).collect()
    }

    pub fn calculation_count(&self) -> CommissionResult<i64> {
        let count = self.conn()?.query_row(
            "SELECT COUNT(*) FROM commission_calculation",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
