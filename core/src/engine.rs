//! The commission engine: the surface the surrounding application uses.
//!
//! DATA FLOW:
//!   record store → work items → rate registry lookup → unit calculator
//!   → per-item results → statistics; results go back through `persist`.
//!
//! RULES:
//!   - The registry is loaded once and shared read-only for the engine's life.
//!   - The record store is injected; the engine owns no database.

use crate::{
    calculation::CommissionCalculation,
    calculator::{calculate, CalculationRequest, PremiumInput},
    config::EngineConfig,
    error::{CommissionError, CommissionResult},
    gateway::RecordStore,
    orchestrator::{BatchOrchestrator, BatchReport, ProjectsReport, RunControl},
    rate_registry::{CommissionConfig, RateRegistry},
    stats::{aggregate, CommissionStats},
    types::ProjectId,
};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub type ProgressFn<'a> = Box<dyn FnMut(usize, usize) + Send + 'a>;

#[derive(Default)]
pub struct CalculateAllOptions<'a> {
    /// Falls back to the engine config's default batch size.
    pub batch_size:  Option<usize>,
    pub on_progress: Option<ProgressFn<'a>>,
    pub cancel:      Option<CancellationToken>,
}

pub struct CommissionEngine {
    registry:     Arc<RateRegistry>,
    store:        Arc<dyn RecordStore>,
    config:       EngineConfig,
    orchestrator: BatchOrchestrator,
}

impl CommissionEngine {
    pub fn new(registry: RateRegistry, store: Arc<dyn RecordStore>, config: EngineConfig) -> Self {
        let registry = Arc::new(registry);
        let orchestrator = BatchOrchestrator::new(Arc::clone(&registry), Arc::clone(&store));
        log::info!(
            "engine: ready with {} active carriers, batch size {}",
            registry.list_active().len(),
            config.default_batch_size
        );
        Self {
            registry,
            store,
            config,
            orchestrator,
        }
    }

    pub fn registry(&self) -> &RateRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Interactive what-if calculation. No I/O.
    pub fn calculate_one(
        &self,
        carrier_name: &str,
        monthly_premium: impl Into<PremiumInput>,
    ) -> CommissionCalculation {
        calculate(&self.registry, &CalculationRequest::new(carrier_name, monthly_premium))
    }

    pub async fn calculate_for_project(&self, project_id: &str) -> CommissionResult<Vec<CommissionCalculation>> {
        let control = self.run_control(None);
        let report = self
            .orchestrator
            .run_for_project(project_id, self.config.default_batch_size, &control, |_, _| {})
            .await?;
        Ok(report.results)
    }

    /// Explicit project list; unreadable projects are reported, not fatal.
    pub async fn calculate_for_projects(&self, project_ids: &[ProjectId]) -> CommissionResult<ProjectsReport> {
        let control = self.run_control(None);
        self.orchestrator
            .run_for_projects(project_ids, self.config.default_batch_size, &control, |done, total| {
                log::debug!("engine: {done}/{total} projects processed");
            })
            .await
    }

    pub async fn calculate_all(
        &self,
        options: CalculateAllOptions<'_>,
    ) -> CommissionResult<Vec<CommissionCalculation>> {
        Ok(self.run_all(options).await?.results)
    }

    /// Like `calculate_all`, but also says whether the run stopped early.
    pub async fn run_all(&self, options: CalculateAllOptions<'_>) -> CommissionResult<BatchReport> {
        let CalculateAllOptions {
            batch_size,
            mut on_progress,
            cancel,
        } = options;
        let batch_size = batch_size.unwrap_or(self.config.default_batch_size);
        if batch_size == 0 {
            return Err(CommissionError::InvalidBatchSize);
        }
        let control = self.run_control(cancel);

        let items = self.orchestrator.collect_all_items().await?;
        let report = self
            .orchestrator
            .run_batch_with(items, batch_size, &control, |done, total| {
                if let Some(progress) = on_progress.as_mut() {
                    progress(done, total);
                }
            })
            .await?;

        log::info!(
            "engine: run finished, {}/{} items{}",
            report.processed,
            report.total,
            if report.stopped_early { " (stopped early)" } else { "" }
        );
        Ok(report)
    }

    pub async fn persist(&self, results: &[CommissionCalculation]) -> CommissionResult<()> {
        self.store.upsert_calculations(results).await
    }

    pub fn get_stats(&self, results: &[CommissionCalculation]) -> CommissionStats {
        aggregate(results)
    }

    /// Active carrier configs, ordered by carrier.
    pub fn list_configs(&self) -> Vec<CommissionConfig> {
        self.registry.list_active().into_iter().cloned().collect()
    }

    fn run_control(&self, cancel: Option<CancellationToken>) -> RunControl {
        RunControl {
            cancel,
            deadline: self.config.run_deadline().map(|d| Instant::now() + d),
        }
    }
}
