// ABOUTME: Observer hooks for pipeline progress.
// ABOUTME: The CLI output implements these; the default observer ignores everything.

use super::{EntityOutcome, HolderReport, StageKind};

/// Receives pipeline events as they happen.
pub trait Progress: Send + Sync {
    fn stage_started(&self, _stage: StageKind, _entities: usize) {}

    fn entity_resolved(&self, _stage: StageKind, _outcome: &EntityOutcome) {}

    fn holders_reported(&self, _report: &HolderReport) {}
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Progress for Silent {}
