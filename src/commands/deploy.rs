// ABOUTME: Deploy command implementation.
// ABOUTME: Takes the run lock, then drives the pipeline against the gateway.

use banksmith::deployer::{HttpDeployer, TimeoutDeployer};
use banksmith::diagnostics::{Diagnostics, Warning};
use banksmith::error::{Error, Result};
use banksmith::lock::RunLock;
use banksmith::output::Output;
use banksmith::pipeline::{Orchestrator, Pipeline};
use banksmith::store::FileReceiptStore;
use std::time::Duration;

use super::Workspace;

/// Command-line overrides for one deployment.
pub struct DeployOptions {
    pub gateway: String,
    pub timeout_secs: Option<u64>,
    pub concurrency: Option<usize>,
    pub force: bool,
}

/// Deploy every configured entity that has no receipt yet.
pub async fn deploy(workspace: &Workspace, options: DeployOptions, mut output: Output) -> Result<()> {
    let config = &workspace.config;
    output.start_timer();

    let gateway =
        HttpDeployer::new(&options.gateway).map_err(|e| Error::InvalidGateway(e.to_string()))?;
    let timeout = options
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(config.deploy.timeout);
    let deployer = TimeoutDeployer::new(gateway, timeout);

    let store = FileReceiptStore::open(&workspace.state_dir)?;
    output.progress(&format!(
        "Deploying {} bank(s) from {} via {} (receipts in {})",
        config.banks.len(),
        workspace.config_path.display(),
        options.gateway,
        store.dir().display()
    ));

    output.progress("  → Acquiring run lock...");
    let lock = RunLock::acquire(store.dir(), options.force)?;

    let mut orchestrator = Orchestrator::new(config, &deployer, &store).progress(&output);
    if let Some(concurrency) = options.concurrency {
        orchestrator = orchestrator.concurrency(concurrency);
    }
    let result = orchestrator.run().await;

    let mut diag = Diagnostics::default();
    if let Err(e) = lock.release() {
        diag.warn(Warning::lock_release(format!("Failed to release run lock: {e}")));
    }

    let report = result.inspect_err(|_| {
        for warning in diag.warnings() {
            output.warning(&warning.message);
        }
    })?;
    for warning in &report.warnings {
        output.warning(&warning.message);
    }

    let mut planning = Diagnostics::default();
    let orphaned = Pipeline::plan(config, &mut planning).orphaned(&store)?;
    for key in orphaned {
        diag.warn(Warning::orphaned_receipt(format!(
            "Receipt {key} matches no configured entity"
        )));
    }

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let summary = report.summary();
    output.success(&format!(
        "Deployment complete: {} created, {} reconciled, {} unchanged",
        summary.created, summary.reconciled, summary.skipped
    ));
    Ok(())
}
