// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during planning and deployment.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create an unknown service warning.
    pub fn unknown_service(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UnknownService,
            message: message.into(),
        }
    }

    /// Create a lock release warning.
    pub fn lock_release(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::LockRelease,
            message: message.into(),
        }
    }

    /// Create an orphaned receipt warning.
    pub fn orphaned_receipt(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::OrphanedReceipt,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// A configured service has no contract and was left out.
    UnknownService,
    /// Failed to release the run lock (lock file may remain).
    LockRelease,
    /// A recorded receipt matches nothing in the configuration.
    OrphanedReceipt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::unknown_service("LOANS has no contract"));
        diag.warn(Warning::lock_release("failed to remove lock file"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
        assert_eq!(diag.into_warnings().len(), 2);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(
            Warning::unknown_service("test").kind,
            WarningKind::UnknownService
        );
        assert_eq!(Warning::lock_release("test").kind, WarningKind::LockRelease);
        assert_eq!(
            Warning::orphaned_receipt("test").kind,
            WarningKind::OrphanedReceipt
        );
    }
}
