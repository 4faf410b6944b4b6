// ABOUTME: Status command implementation.
// ABOUTME: Compares the planned entities with the receipts on disk, offline.

use banksmith::diagnostics::Diagnostics;
use banksmith::error::Result;
use banksmith::output::Output;
use banksmith::pipeline::Pipeline;
use banksmith::store::{FileReceiptStore, MemoryReceiptStore, ReceiptStore};

use super::Workspace;

pub fn status(workspace: &Workspace, output: &Output) -> Result<()> {
    let mut diag = Diagnostics::default();
    let pipeline = Pipeline::plan(&workspace.config, &mut diag);

    // A missing receipt directory means nothing was deployed yet; don't create it.
    let store: Box<dyn ReceiptStore> = if workspace.state_dir.is_dir() {
        Box::new(FileReceiptStore::open(&workspace.state_dir)?)
    } else {
        Box::new(MemoryReceiptStore::new())
    };

    output.progress(&format!(
        "Status of {} (receipts in {})",
        workspace.config_path.display(),
        workspace.state_dir.display()
    ));
    let statuses = pipeline.status(store.as_ref())?;
    for status in &statuses {
        let text = match &status.address {
            Some(address) => format!("  ✓ {:<36} {}", status.key, address),
            None => format!("  · {:<36} pending", status.key),
        };
        output.record(status, &text);
    }

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
    for key in pipeline.orphaned(store.as_ref())? {
        output.warning(&format!("Receipt {key} matches no configured entity"));
    }

    let deployed = statuses.iter().filter(|s| s.is_deployed()).count();
    output.success(&format!(
        "{deployed} of {} entities deployed",
        statuses.len()
    ));
    Ok(())
}
