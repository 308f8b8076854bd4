//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine reaches it through the `RecordStore` trait; the inherent
//! methods are for seeding, administration and tests.

use crate::{
    calculation::CommissionCalculation,
    error::{CommissionError, CommissionResult},
    gateway::{ContractRecord, ProjectRecord, RecordStore},
    types::ProjectId,
};
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

mod calculation;
mod carrier_config;
mod records;

/// Clones share one connection. The async `RecordStore` methods run
/// their queries on tokio's blocking pool; the inherent methods block.
#[derive(Clone)]
pub struct CommissionStore {
    conn: Arc<Mutex<Connection>>,
}

impl CommissionStore {
    pub fn open(path: &str) -> CommissionResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> CommissionResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CommissionResult<()> {
        self.conn()?
            .execute_batch(include_str!("../../../migrations/001_commission.sql"))?;
        Ok(())
    }

    fn conn(&self) -> CommissionResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CommissionError::Persistence("store connection poisoned".into()))
    }

    /// Run `op` against a clone of this store on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> CommissionResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&CommissionStore) -> CommissionResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| CommissionError::Persistence(format!("store task failed: {e}")))?
    }
}

#[async_trait]
impl RecordStore for CommissionStore {
    async fn read_project(&self, id: &str) -> CommissionResult<ProjectRecord> {
        let id = id.to_string();
        self.blocking(move |store| {
            store.project(&id)?.ok_or_else(|| CommissionError::SourceUnavailable {
                what:   format!("project {id}"),
                reason: "not found".into(),
            })
        })
        .await
    }

    async fn read_contracts_for_project(&self, id: &str) -> CommissionResult<Vec<ContractRecord>> {
        let id = id.to_string();
        self.blocking(move |store| store.contracts_for_project(&id)).await
    }

    async fn read_all_project_ids(&self) -> CommissionResult<Vec<ProjectId>> {
        self.blocking(|store| store.project_ids()).await
    }

    async fn read_contract(&self, id: &str) -> CommissionResult<ContractRecord> {
        let id = id.to_string();
        self.blocking(move |store| {
            store.contract(&id)?.ok_or_else(|| CommissionError::ItemResolution {
                contract_id: id.clone(),
                reason:      "not found".into(),
            })
        })
        .await
    }

    async fn upsert_calculations(&self, results: &[CommissionCalculation]) -> CommissionResult<()> {
        let results = results.to_vec();
        self.blocking(move |store| store.upsert_calculation_rows(&results))
            .await
            .map_err(|e| match e {
                CommissionError::Persistence(_) => e,
                other => CommissionError::Persistence(other.to_string()),
            })
    }
}
