// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes; reports pipeline progress.

use serde::Serialize;
use std::time::Instant;

use crate::pipeline::{EntityAction, EntityOutcome, HolderReport, Progress, StageKind};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a warning (suppressed in quiet mode).
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => emit(&JsonEvent {
                event: "warning",
                message,
                duration_secs: None,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => emit(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print a structured record: JSON in json mode, `text` otherwise.
    pub fn record<T: Serialize>(&self, value: &T, text: &str) {
        match self.mode {
            OutputMode::Json => emit(value),
            OutputMode::Normal | OutputMode::Quiet => println!("{text}"),
        }
    }
}

impl Progress for Output {
    fn stage_started(&self, stage: StageKind, entities: usize) {
        match self.mode {
            OutputMode::Normal => println!("==> {stage} ({entities})"),
            OutputMode::Quiet => {}
            OutputMode::Json => emit(&StageEvent {
                event: "stage",
                stage,
                entities,
            }),
        }
    }

    fn entity_resolved(&self, stage: StageKind, outcome: &EntityOutcome) {
        match self.mode {
            OutputMode::Normal => {
                let verb = match outcome.action {
                    EntityAction::Created => "deployed",
                    EntityAction::Reconciled => "reconciled",
                    EntityAction::Skipped => "already deployed",
                };
                println!(
                    "  → {} {} at {}",
                    outcome.description,
                    verb,
                    outcome.receipt.address()
                );
                if outcome.holders_registered > 0 {
                    println!(
                        "    + {} holder registration(s)",
                        outcome.holders_registered
                    );
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Json => emit(&EntityEvent {
                event: "entity",
                stage,
                key: outcome.key.as_str(),
                action: outcome.action,
                address: outcome.receipt.address().as_str(),
                registrations: outcome.registrations,
                holders_registered: outcome.holders_registered,
            }),
        }
    }

    fn holders_reported(&self, report: &HolderReport) {
        match self.mode {
            OutputMode::Normal => {
                for line in report.to_string().lines() {
                    println!("  → {line}");
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Json => emit(&HoldersEvent {
                event: "holders",
                report,
            }),
        }
    }
}

fn emit<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        println!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct StageEvent {
    event: &'static str,
    stage: StageKind,
    entities: usize,
}

#[derive(Serialize)]
struct EntityEvent<'a> {
    event: &'static str,
    stage: StageKind,
    key: &'a str,
    action: EntityAction,
    address: &'a str,
    registrations: usize,
    holders_registered: usize,
}

#[derive(Serialize)]
struct HoldersEvent<'a> {
    event: &'static str,
    #[serde(flatten)]
    report: &'a HolderReport,
}
