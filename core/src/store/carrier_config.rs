//! Administrative path for carrier rates. Changes land here between runs;
//! a run works from the registry it loaded at startup.

use super::CommissionStore;
use crate::{
    error::{CommissionError, CommissionResult},
    rate_registry::{normalize_carrier, CommissionConfig, CommissionType, RateRegistry},
};
use chrono::{DateTime, Utc};
use rusqlite::params;

impl CommissionStore {
    /// Insert or update one carrier. `created_at` survives updates.
    pub fn save_carrier_config(&self, config: &CommissionConfig) -> CommissionResult<()> {
        let carrier = normalize_carrier(&config.carrier);
        self.conn()?.execute(
            "INSERT INTO carrier_config (
                carrier, rate_year1, rate_recurring, commission_type,
                active, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(carrier) DO UPDATE SET
                rate_year1      = excluded.rate_year1,
                rate_recurring  = excluded.rate_recurring,
                commission_type = excluded.commission_type,
                active          = excluded.active,
                updated_at      = excluded.updated_at",
            params![
                carrier,
                config.rate_year1,
                config.rate_recurring,
                config.commission_type.as_str(),
                if config.active { 1i64 } else { 0i64 },
                config.created_at,
                Utc::now(),
            ],
        )?;
        log::info!("store: carrier config {carrier} saved (active={})", config.active);
        Ok(())
    }

    /// Seed the table from a registry, e.g. the JSON rate table.
    pub fn seed_carrier_configs(&self, registry: &RateRegistry) -> CommissionResult<()> {
        for config in registry.all() {
            self.save_carrier_config(config)?;
        }
        Ok(())
    }

    /// Build a fresh registry from the stored configs.
    pub fn load_rate_registry(&self) -> CommissionResult<RateRegistry> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT carrier, rate_year1, rate_recurring, commission_type,
                    active, created_at, updated_at
             FROM carrier_config ORDER BY carrier ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)? != 0,
                    row.get::<_, DateTime<Utc>>(5)?,
                    row.get::<_, DateTime<Utc>>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let configs = rows
            .into_iter()
            .map(|(carrier, rate_year1, rate_recurring, kind, active, created_at, updated_at)| {
                let commission_type = CommissionType::parse(&kind).ok_or_else(|| {
                    CommissionError::Persistence(format!(
                        "carrier {carrier} has unknown commission type '{kind}'"
                    ))
                })?;
                Ok(CommissionConfig {
                    carrier,
                    rate_year1,
                    rate_recurring,
                    commission_type,
                    active,
                    created_at,
                    updated_at,
                })
            })
            .collect::<CommissionResult<Vec<_>>>()?;

        Ok(RateRegistry::from_configs(configs))
    }
}
