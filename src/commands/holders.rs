// ABOUTME: Holders command implementation.
// ABOUTME: Reads back each configured holder's identifiers from the registry.

use banksmith::deployer::{HttpDeployer, TimeoutDeployer};
use banksmith::error::{Error, Result};
use banksmith::output::Output;
use banksmith::pipeline::{Orchestrator, Progress};
use banksmith::store::FileReceiptStore;

use super::Workspace;

pub async fn holders(workspace: &Workspace, gateway: &str, output: &Output) -> Result<()> {
    let config = &workspace.config;
    let gateway = HttpDeployer::new(gateway).map_err(|e| Error::InvalidGateway(e.to_string()))?;
    let deployer = TimeoutDeployer::new(gateway, config.deploy.timeout);
    let store = FileReceiptStore::open(&workspace.state_dir)?;

    let report = Orchestrator::new(config, &deployer, &store)
        .report_holders()
        .await?;
    output.holders_reported(&report);
    Ok(())
}
