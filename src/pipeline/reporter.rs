// ABOUTME: Final stage: read back the identifiers each configured holder owns.
// ABOUTME: Read-only; with no holders configured it makes no ledger calls at all.

use std::fmt;

use serde::Serialize;

use super::StageError;
use crate::deployer::{Arg, Deployer, methods};
use crate::store::ReceiptStore;
use crate::types::EntityKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolderEntry {
    pub holder: String,
    pub identifiers: Vec<String>,
}

/// Identifiers per holder, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HolderReport {
    pub holders: Vec<HolderEntry>,
}

impl HolderReport {
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}

impl fmt::Display for HolderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.holders.is_empty() {
            return write!(f, "no holder registered");
        }

        for (i, entry) in self.holders.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", entry.holder, entry.identifiers.join(", "))?;
        }
        Ok(())
    }
}

/// Query the registry for every holder's identifiers.
pub async fn report_holders(
    deployer: &dyn Deployer,
    store: &dyn ReceiptStore,
    holders: &[&str],
) -> Result<HolderReport, StageError> {
    if holders.is_empty() {
        tracing::info!("No holder configured for auto-registration");
        return Ok(HolderReport::default());
    }

    let registry_key = EntityKey::registry();
    let registry = store
        .find(&registry_key)?
        .ok_or_else(|| StageError::MissingDependency {
            needed_by: "holder report".to_string(),
            dependency: registry_key.clone(),
        })?;

    let mut report = HolderReport::default();
    for holder in holders {
        let answer = deployer
            .call(
                registry.address(),
                methods::GET_PANS,
                &[Arg::text(*holder)],
            )
            .await
            .map_err(|source| StageError::QueryFailed {
                key: registry_key.clone(),
                method: methods::GET_PANS,
                source,
            })?;
        let identifiers = answer
            .as_texts()
            .ok_or_else(|| StageError::UnexpectedResponse {
                key: (*holder).to_string(),
                method: methods::GET_PANS,
                detail: format!("expected a list of strings, got {answer:?}"),
            })?;

        tracing::info!("Holder {} owns {}", holder, identifiers.join(", "));
        report.holders.push(HolderEntry {
            holder: (*holder).to_string(),
            identifiers,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_says_so() {
        assert_eq!(HolderReport::default().to_string(), "no holder registered");
    }

    #[test]
    fn report_lists_holders_in_order() {
        let report = HolderReport {
            holders: vec![
                HolderEntry {
                    holder: "alice".into(),
                    identifiers: vec!["0x01".into(), "0x02".into()],
                },
                HolderEntry {
                    holder: "bob".into(),
                    identifiers: vec![],
                },
            ],
        };
        assert_eq!(report.to_string(), "alice: 0x01, 0x02\nbob: ");
    }
}
