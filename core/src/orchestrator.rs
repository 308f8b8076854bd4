//! Batch orchestrator: fans calculations out over bounded chunks.
//!
//! EXECUTION MODEL:
//!   1. Work items are split into consecutive chunks of `batch_size`.
//!   2. Every item in a chunk runs as its own task; the chunk settles only
//!      when all of its tasks have finished, successfully or not.
//!   3. Chunk N+1 starts after chunk N has settled. Peak concurrency is
//!      therefore `batch_size`.
//!   4. Progress is reported once per settled chunk.
//!
//! RULES:
//!   - One result per input item. A failing item becomes an `error`-status
//!     result; it never aborts its siblings or the batch.
//!   - Only a failure to enumerate the work itself is returned as `Err`.
//!   - Cancellation and the run deadline are checked between chunks. A
//!     stopped run keeps the chunks that already settled and nothing else.

use crate::{
    calculation::CommissionCalculation,
    calculator::{calculate, CalculationRequest},
    error::{CommissionError, CommissionResult},
    gateway::{ContractRecord, ProjectRecord, RecordStore},
    rate_registry::RateRegistry,
    types::{ItemIdentifiers, ProjectId},
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::{task::JoinError, time::Instant};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// One contract to calculate. The contract data may already be in hand;
/// otherwise it is read from the record store by contract id.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub ids:      ItemIdentifiers,
    pub contract: Option<ContractRecord>,
}

impl WorkItem {
    pub fn resolved(project: Option<&ProjectRecord>, contract: ContractRecord) -> Self {
        let ids = ItemIdentifiers::for_contract(
            project.map(|p| p.id.clone()).or_else(|| contract.project_id.clone()),
            project.and_then(|p| p.contact_id.clone()),
            contract.id.clone(),
        );
        Self { ids, contract: Some(contract) }
    }

    pub fn unresolved(ids: ItemIdentifiers) -> Self {
        Self { ids, contract: None }
    }

    fn carrier_hint(&self) -> String {
        self.contract
            .as_ref()
            .map(|c| c.carrier_name.clone())
            .unwrap_or_default()
    }
}

/// Cooperative stop signals, checked between chunks.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    pub cancel:   Option<CancellationToken>,
    pub deadline: Option<Instant>,
}

impl RunControl {
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn stop_reason(&self) -> Option<&'static str> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Some("cancelled");
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some("deadline reached");
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results:       Vec<CommissionCalculation>,
    pub processed:     usize,
    pub total:         usize,
    pub stopped_early: bool,
}

/// Outcome of an explicit project list, where one project's failure does
/// not stop the others.
#[derive(Debug, Clone, Default)]
pub struct ProjectsReport {
    pub results:         Vec<CommissionCalculation>,
    pub failed_projects: Vec<(ProjectId, String)>,
    pub stopped_early:   bool,
}

/// Per-task outcome, collapsed into a result at chunk-join time.
enum ItemOutcome {
    Settled(CommissionCalculation),
    Failed {
        reason:       String,
        ids:          ItemIdentifiers,
        carrier_name: String,
    },
}

impl ItemOutcome {
    fn from_join(
        joined: Result<CommissionResult<CommissionCalculation>, JoinError>,
        ids: ItemIdentifiers,
        carrier_name: String,
    ) -> Self {
        match joined {
            Ok(Ok(calc)) => Self::Settled(calc),
            Ok(Err(e)) => {
                log::warn!("batch: item {} failed: {e}", ids.label());
                Self::Failed { reason: e.to_string(), ids, carrier_name }
            }
            Err(e) => {
                log::error!("batch: task for item {} aborted: {e}", ids.label());
                Self::Failed {
                    reason: format!("Calculation task aborted: {e}"),
                    ids,
                    carrier_name,
                }
            }
        }
    }

    fn into_calculation(self) -> CommissionCalculation {
        match self {
            Self::Settled(calc) => calc,
            Self::Failed { reason, ids, carrier_name } => {
                CommissionCalculation::failed(&carrier_name, &ids, reason)
            }
        }
    }
}

pub struct BatchOrchestrator {
    registry: Arc<RateRegistry>,
    store:    Arc<dyn RecordStore>,
}

impl BatchOrchestrator {
    pub fn new(registry: Arc<RateRegistry>, store: Arc<dyn RecordStore>) -> Self {
        Self { registry, store }
    }

    /// Calculate every item, `batch_size` at a time.
    /// `on_progress(processed, total)` fires after each chunk.
    pub async fn run_batch(
        &self,
        items: Vec<WorkItem>,
        batch_size: usize,
        on_progress: impl FnMut(usize, usize),
    ) -> CommissionResult<Vec<CommissionCalculation>> {
        let report = self
            .run_batch_with(items, batch_size, &RunControl::default(), on_progress)
            .await?;
        Ok(report.results)
    }

    pub async fn run_batch_with(
        &self,
        items: Vec<WorkItem>,
        batch_size: usize,
        control: &RunControl,
        mut on_progress: impl FnMut(usize, usize),
    ) -> CommissionResult<BatchReport> {
        if batch_size == 0 {
            return Err(CommissionError::InvalidBatchSize);
        }

        let total = items.len();
        let chunk_count = total.div_ceil(batch_size);
        let mut results = Vec::with_capacity(total);
        let mut stopped_early = false;
        let mut remaining = items.into_iter();

        log::info!("batch: {total} items in {chunk_count} chunks of up to {batch_size}");

        for chunk_index in 0..chunk_count {
            if let Some(reason) = control.stop_reason() {
                log::warn!(
                    "batch: stopping before chunk {}/{chunk_count} ({reason}); {} of {total} settled",
                    chunk_index + 1,
                    results.len()
                );
                stopped_early = true;
                break;
            }

            let chunk: Vec<WorkItem> = remaining.by_ref().take(batch_size).collect();
            let settled = self.run_chunk(chunk).await;
            results.extend(settled);

            log::debug!(
                "batch: chunk {}/{chunk_count} settled, {}/{total} processed",
                chunk_index + 1,
                results.len()
            );
            on_progress(results.len(), total);
        }

        Ok(BatchReport {
            processed: results.len(),
            results,
            total,
            stopped_early,
        })
    }

    async fn run_chunk(&self, chunk: Vec<WorkItem>) -> Vec<CommissionCalculation> {
        let mut labels = Vec::with_capacity(chunk.len());
        let mut handles = Vec::with_capacity(chunk.len());

        for item in chunk {
            labels.push((item.ids.clone(), item.carrier_hint()));
            let registry = Arc::clone(&self.registry);
            let store = Arc::clone(&self.store);
            handles.push(tokio::spawn(process_item(registry, store, item)));
        }

        join_all(handles)
            .await
            .into_iter()
            .zip(labels)
            .map(|(joined, (ids, carrier))| {
                ItemOutcome::from_join(joined, ids, carrier).into_calculation()
            })
            .collect()
    }

    /// Resolve one project's contracts, then run them as a batch.
    /// Failing to read the project or its contracts is fatal for this call.
    pub async fn run_for_project(
        &self,
        project_id: &str,
        batch_size: usize,
        control: &RunControl,
        on_progress: impl FnMut(usize, usize),
    ) -> CommissionResult<BatchReport> {
        let items = self.project_items(project_id).await?;
        self.run_batch_with(items, batch_size, control, on_progress).await
    }

    /// Run an explicit list of projects one after another, continuing past
    /// projects whose records cannot be read.
    /// `on_progress(projects_done, projects_total)` fires after each project.
    pub async fn run_for_projects(
        &self,
        project_ids: &[ProjectId],
        batch_size: usize,
        control: &RunControl,
        mut on_progress: impl FnMut(usize, usize),
    ) -> CommissionResult<ProjectsReport> {
        if batch_size == 0 {
            return Err(CommissionError::InvalidBatchSize);
        }

        let mut report = ProjectsReport::default();
        for (done, project_id) in project_ids.iter().enumerate() {
            match self.run_for_project(project_id, batch_size, control, |_, _| {}).await {
                Ok(batch) => {
                    report.results.extend(batch.results);
                    report.stopped_early = batch.stopped_early;
                }
                Err(e) => {
                    log::warn!("batch: project {project_id} skipped: {e}");
                    report.failed_projects.push((project_id.clone(), e.to_string()));
                }
            }
            on_progress(done + 1, project_ids.len());
            if report.stopped_early {
                break;
            }
        }
        Ok(report)
    }

    /// Work items for every project in the store. Any read failure is fatal.
    pub async fn collect_all_items(&self) -> CommissionResult<Vec<WorkItem>> {
        let project_ids = self
            .store
            .read_all_project_ids()
            .await
            .map_err(|e| source_unavailable("project list", e))?;

        let mut items = Vec::new();
        for project_id in &project_ids {
            items.extend(self.project_items(project_id).await?);
        }
        log::debug!("batch: {} projects yield {} work items", project_ids.len(), items.len());
        Ok(items)
    }

    async fn project_items(&self, project_id: &str) -> CommissionResult<Vec<WorkItem>> {
        let project = self
            .store
            .read_project(project_id)
            .await
            .map_err(|e| source_unavailable(&format!("project {project_id}"), e))?;
        let contracts = self
            .store
            .read_contracts_for_project(project_id)
            .await
            .map_err(|e| source_unavailable(&format!("contracts of project {project_id}"), e))?;

        Ok(contracts
            .into_iter()
            .map(|c| WorkItem::resolved(Some(&project), c))
            .collect())
    }
}

fn source_unavailable(what: &str, e: CommissionError) -> CommissionError {
    match e {
        already @ CommissionError::SourceUnavailable { .. } => already,
        other => CommissionError::SourceUnavailable {
            what:   what.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Resolve the item's contract if needed, then run the pure calculator.
async fn process_item(
    registry: Arc<RateRegistry>,
    store: Arc<dyn RecordStore>,
    item: WorkItem,
) -> CommissionResult<CommissionCalculation> {
    let contract = match item.contract {
        Some(contract) => contract,
        None => {
            let contract_id = item.ids.contract_id.clone().ok_or_else(|| {
                CommissionError::ItemResolution {
                    contract_id: String::new(),
                    reason:      "work item carries no contract id".into(),
                }
            })?;
            store
                .read_contract(&contract_id)
                .await
                .map_err(|e| CommissionError::ItemResolution {
                    contract_id: contract_id.clone(),
                    reason:      e.to_string(),
                })?
        }
    };

    let mut ids = item.ids;
    if ids.project_id.is_none() {
        ids.project_id = contract.project_id.clone();
    }
    if ids.contract_id.is_none() {
        ids.contract_id = Some(contract.id.clone());
    }

    let request = CalculationRequest {
        carrier_name:    contract.carrier_name,
        monthly_premium: contract.monthly_premium,
        ids,
    };
    Ok(calculate(&registry, &request))
}
