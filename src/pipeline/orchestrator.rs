// ABOUTME: Drives every stage in order against one deployer and receipt store.
// ABOUTME: Aborts on the first failing stage; receipts already written persist.

use serde::Serialize;
use snafu::ResultExt;

use super::error::StageSnafu;
use super::{
    EntityAction, EntityOutcome, HolderReport, Pipeline, PipelineError, Progress, Silent,
    StageKind, StageRunner, report_holders,
};
use crate::config::Config;
use crate::deployer::Deployer;
use crate::diagnostics::{Diagnostics, Warning};
use crate::store::ReceiptStore;

/// Outcomes of one completed stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub kind: StageKind,
    pub outcomes: Vec<EntityOutcome>,
    /// Set only for the holders stage.
    pub holders: Option<HolderReport>,
}

/// Everything a successful run did.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
    pub holders: HolderReport,
    pub warnings: Vec<Warning>,
}

impl PipelineReport {
    pub fn outcomes(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.stages.iter().flat_map(|stage| stage.outcomes.iter())
    }

    pub fn count(&self, action: EntityAction) -> usize {
        self.outcomes().filter(|o| o.action == action).count()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            created: self.count(EntityAction::Created),
            reconciled: self.count(EntityAction::Reconciled),
            skipped: self.count(EntityAction::Skipped),
            holders_registered: self.outcomes().map(|o| o.holders_registered).sum(),
        }
    }
}

/// Per-action totals of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub created: usize,
    pub reconciled: usize,
    pub skipped: usize,
    pub holders_registered: usize,
}

/// Runs the whole pipeline for one configuration.
pub struct Orchestrator<'a> {
    config: &'a Config,
    deployer: &'a dyn Deployer,
    store: &'a dyn ReceiptStore,
    concurrency: usize,
    progress: &'a dyn Progress,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a Config, deployer: &'a dyn Deployer, store: &'a dyn ReceiptStore) -> Self {
        Self {
            config,
            deployer,
            store,
            concurrency: config.deploy.concurrency,
            progress: &Silent,
        }
    }

    /// Override the configured per-stage concurrency.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// Re-running after a failure resumes: entities with receipts are skipped
    /// (after their registrations are re-checked) and the rest are created.
    pub async fn run(&self) -> Result<PipelineReport, PipelineError> {
        let mut diagnostics = Diagnostics::default();
        let pipeline = Pipeline::plan(self.config, &mut diagnostics);
        pipeline.validate()?;

        let runner = StageRunner::new(self.deployer, self.store).concurrency(self.concurrency);
        let mut report = PipelineReport::default();

        for stage in pipeline.stages() {
            tracing::info!("Stage {}: {} entities", stage.kind, stage.entities.len());
            self.progress.stage_started(stage.kind, stage.entities.len());

            if stage.kind == StageKind::Holders {
                let holders = report_holders(self.deployer, self.store, pipeline.holders())
                    .await
                    .context(StageSnafu { stage: stage.kind })
                    .inspect_err(|e| tracing::error!("{e}"))?;
                self.progress.holders_reported(&holders);
                report.holders = holders;
                continue;
            }

            let outcomes = runner
                .run(stage, self.progress)
                .await
                .context(StageSnafu { stage: stage.kind })
                .inspect_err(|e| tracing::error!("{e}"))?;
            report.stages.push(StageReport {
                kind: stage.kind,
                outcomes,
                holders: None,
            });
        }

        report.warnings = diagnostics.into_warnings();
        Ok(report)
    }

    /// Run a single stage. Its prerequisites must already have receipts.
    ///
    /// For [`StageKind::Holders`] the report is carried in
    /// [`StageReport::holders`] and the outcome list stays empty.
    pub async fn run_stage(&self, kind: StageKind) -> Result<StageReport, PipelineError> {
        let mut diagnostics = Diagnostics::default();
        let pipeline = Pipeline::plan(self.config, &mut diagnostics);
        let Some(stage) = pipeline.stage(kind) else {
            return Ok(StageReport {
                kind,
                outcomes: vec![],
                holders: None,
            });
        };

        self.progress.stage_started(kind, stage.entities.len());
        if kind == StageKind::Holders {
            let holders = report_holders(self.deployer, self.store, pipeline.holders())
                .await
                .context(StageSnafu { stage: kind })?;
            self.progress.holders_reported(&holders);
            return Ok(StageReport {
                kind,
                outcomes: vec![],
                holders: Some(holders),
            });
        }

        let outcomes = StageRunner::new(self.deployer, self.store)
            .concurrency(self.concurrency)
            .run(stage, self.progress)
            .await
            .context(StageSnafu { stage: kind })?;
        Ok(StageReport {
            kind,
            outcomes,
            holders: None,
        })
    }

    /// Read back holder identifiers without deploying anything.
    pub async fn report_holders(&self) -> Result<HolderReport, PipelineError> {
        let holders = self.config.auto_register_holders();
        report_holders(self.deployer, self.store, &holders)
            .await
            .context(StageSnafu {
                stage: StageKind::Holders,
            })
    }
}
