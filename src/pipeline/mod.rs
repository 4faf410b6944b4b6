// ABOUTME: Deployment orchestration: planning, idempotent stage execution, reporting.
// ABOUTME: Stages run in a fixed order, chained by the receipts earlier stages record.

mod entity;
mod error;
mod orchestrator;
mod progress;
mod reporter;
mod runner;
mod stage;

pub use entity::{Entity, Parents, RegistrationEdge};
pub use error::{PipelineError, StageError, StageErrorKind};
pub use orchestrator::{Orchestrator, PipelineReport, RunSummary, StageReport};
pub use progress::{Progress, Silent};
pub use reporter::{HolderEntry, HolderReport, report_holders};
pub use runner::{EntityAction, EntityOutcome, StageRunner};
pub use stage::{EntityStatus, Pipeline, Stage, StageKind};
