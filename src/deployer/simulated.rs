// ABOUTME: In-memory ledger implementing Deployer for tests and rehearsals.
// ABOUTME: Tracks registrations and holders, counts calls, and injects failures or latency.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Arg, Artifact, ArtifactKind, Deployed, Deployer, DeployerError, TxReceipt, methods};
use crate::store::ResourceCost;
use crate::types::{Address, TxHash};

/// One operation observed by the ledger, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    /// `address` is `None` when the deployment was rejected.
    Deploy {
        contract: ArtifactKind,
        address: Option<Address>,
    },
    Call {
        address: Address,
        method: String,
    },
    Send {
        address: Address,
        method: String,
    },
}

#[derive(Debug)]
struct Contract {
    kind: ArtifactKind,
    args: Vec<Arg>,
    members: HashMap<&'static str, BTreeSet<Address>>,
}

#[derive(Debug)]
struct DeployFailure {
    contract: ArtifactKind,
    needle: Option<Arg>,
}

impl DeployFailure {
    fn matches(&self, artifact: &Artifact) -> bool {
        self.contract == artifact.kind
            && self
                .needle
                .as_ref()
                .is_none_or(|needle| artifact.args.contains(needle))
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    next_id: u64,
    contracts: HashMap<Address, Contract>,
    holders: BTreeMap<String, Vec<String>>,
    calls: Vec<LedgerCall>,
    deploy_failures: Vec<DeployFailure>,
    send_failures: Vec<String>,
}

impl LedgerState {
    fn next_hash(&mut self) -> TxHash {
        self.next_id += 1;
        TxHash::new(format!("0x{:064x}", self.next_id))
    }
}

/// Membership set touched by a registration query or mutation.
fn membership(method: &str) -> Option<(&'static str, bool)> {
    match method {
        methods::REGISTERED_BANK => Some(("banks", false)),
        methods::ADD_BANK => Some(("banks", true)),
        methods::REGISTERED_ACCOUNT => Some(("accounts", false)),
        methods::ADD_ACCOUNT => Some(("accounts", true)),
        methods::REGISTERED_SERVICE => Some(("services", false)),
        methods::ADD_SERVICE => Some(("services", true)),
        _ => None,
    }
}

fn gas_for(kind: ArtifactKind) -> ResourceCost {
    ResourceCost(match kind {
        ArtifactKind::ListLib => 410_000,
        ArtifactKind::XCoin | ArtifactKind::BankAccount => 2_900_000,
        ArtifactKind::Banks => 3_400_000,
        ArtifactKind::Bank => 2_100_000,
        _ => 1_200_000,
    })
}

/// A deployer double that keeps the whole ledger in memory.
///
/// Registration methods (`registeredBank`/`addBank` and friends) behave like
/// set membership on the parent contract. `registerAccountByOwner` records the
/// account address under each holder, and `getPANs` returns those addresses.
#[derive(Debug, Default)]
pub struct SimulatedLedger {
    state: Mutex<LedgerState>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl SimulatedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every operation by `latency` before it is processed.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Reject deployments of `contract`, optionally only those whose
    /// constructor arguments contain `needle`.
    pub fn fail_deploys(&self, contract: ArtifactKind, needle: Option<Arg>) {
        self.state
            .lock()
            .deploy_failures
            .push(DeployFailure { contract, needle });
    }

    /// Reject every `send` of `method`.
    pub fn fail_sends(&self, method: &str) {
        self.state.lock().send_failures.push(method.to_string());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.deploy_failures.clear();
        state.send_failures.clear();
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().calls.clone()
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Successful and rejected deployments seen so far.
    pub fn deploy_count(&self) -> usize {
        self.count(|c| matches!(c, LedgerCall::Deploy { .. }))
    }

    pub fn call_count(&self) -> usize {
        self.count(|c| matches!(c, LedgerCall::Call { .. }))
    }

    pub fn send_count(&self) -> usize {
        self.count(|c| matches!(c, LedgerCall::Send { .. }))
    }

    /// Number of `send`s of one method.
    pub fn sends_of(&self, method: &str) -> usize {
        self.count(|c| matches!(c, LedgerCall::Send { method: m, .. } if m == method))
    }

    fn count(&self, predicate: impl Fn(&LedgerCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Contracts of one kind currently on the ledger.
    pub fn contracts_of(&self, kind: ArtifactKind) -> usize {
        self.state
            .lock()
            .contracts
            .values()
            .filter(|c| c.kind == kind)
            .count()
    }

    pub fn constructor_args(&self, address: &Address) -> Option<Vec<Arg>> {
        self.state
            .lock()
            .contracts
            .get(address)
            .map(|c| c.args.clone())
    }

    /// Whether `child` appears in any membership set of `parent`.
    pub fn is_registered(&self, parent: &Address, child: &Address) -> bool {
        self.state
            .lock()
            .contracts
            .get(parent)
            .is_some_and(|c| c.members.values().any(|set| set.contains(child)))
    }

    /// Drop `child` from every membership set of `parent`.
    pub fn deregister(&self, parent: &Address, child: &Address) {
        if let Some(contract) = self.state.lock().contracts.get_mut(parent) {
            for set in contract.members.values_mut() {
                set.remove(child);
            }
        }
    }

    pub fn holder_identifiers(&self, holder: &str) -> Vec<String> {
        self.state
            .lock()
            .holders
            .get(holder)
            .cloned()
            .unwrap_or_default()
    }

    /// Most operations ever observed in progress at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Deployer for SimulatedLedger {
    async fn deploy(&self, artifact: &Artifact) -> Result<Deployed, DeployerError> {
        self.delay().await;
        let mut state = self.state.lock();

        let rejected = state.deploy_failures.iter().any(|f| f.matches(artifact));
        let unlinked = artifact.kind == ArtifactKind::Banks
            && !artifact
                .libraries
                .contains_key(ArtifactKind::ListLib.contract_name());

        if rejected || unlinked {
            state.calls.push(LedgerCall::Deploy {
                contract: artifact.kind,
                address: None,
            });
            let reason = if unlinked {
                format!("{} references unlinked library ListLib", artifact.kind)
            } else {
                format!("{} reverted during construction", artifact.kind)
            };
            return Err(DeployerError::DeploymentFailed(reason));
        }

        let transaction_hash = state.next_hash();
        let address = Address::new(format!("0x{:040x}", state.next_id));
        state.contracts.insert(
            address.clone(),
            Contract {
                kind: artifact.kind,
                args: artifact.args.clone(),
                members: HashMap::new(),
            },
        );
        state.calls.push(LedgerCall::Deploy {
            contract: artifact.kind,
            address: Some(address.clone()),
        });

        Ok(Deployed {
            address,
            transaction_hash,
            gas_used: gas_for(artifact.kind),
        })
    }

    async fn call(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<Arg, DeployerError> {
        self.delay().await;
        let mut state = self.state.lock();
        state.calls.push(LedgerCall::Call {
            address: address.clone(),
            method: method.to_string(),
        });

        let contract = state
            .contracts
            .get(address)
            .ok_or_else(|| DeployerError::CallFailed(format!("no contract at {address}")))?;

        if method == methods::GET_PANS {
            let holder = args
                .first()
                .and_then(Arg::as_text)
                .ok_or_else(|| DeployerError::CallFailed("getPANs expects a holder".into()))?;
            let identifiers = state.holders.get(holder).cloned().unwrap_or_default();
            return Ok(Arg::texts(identifiers));
        }

        match membership(method) {
            Some((set, false)) => {
                let child = args.first().and_then(Arg::as_address).ok_or_else(|| {
                    DeployerError::CallFailed(format!("{method} expects an address"))
                })?;
                let registered = contract
                    .members
                    .get(set)
                    .is_some_and(|members| members.contains(child));
                Ok(Arg::Bool(registered))
            }
            _ => Err(DeployerError::CallFailed(format!(
                "{} has no query {}",
                contract.kind, method
            ))),
        }
    }

    async fn send(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<TxReceipt, DeployerError> {
        self.delay().await;
        let mut state = self.state.lock();
        state.calls.push(LedgerCall::Send {
            address: address.clone(),
            method: method.to_string(),
        });

        if state.send_failures.iter().any(|m| m == method) {
            return Err(DeployerError::TransactionFailed(format!(
                "{method} reverted"
            )));
        }

        if !state.contracts.contains_key(address) {
            return Err(DeployerError::TransactionFailed(format!(
                "no contract at {address}"
            )));
        }

        if method == methods::REGISTER_ACCOUNT_BY_OWNER {
            let holders = args.first().and_then(Arg::as_texts);
            let account = args.get(1).and_then(Arg::as_address);
            let (Some(holders), Some(account)) = (holders, account) else {
                return Err(DeployerError::TransactionFailed(
                    "registerAccountByOwner expects (holders[], account)".into(),
                ));
            };
            for holder in holders {
                let identifiers = state.holders.entry(holder).or_default();
                if !identifiers.iter().any(|id| id == account.as_str()) {
                    identifiers.push(account.to_string());
                }
            }
        } else {
            let Some((set, true)) = membership(method) else {
                return Err(DeployerError::TransactionFailed(format!(
                    "unknown method {method}"
                )));
            };
            let child = args.first().and_then(Arg::as_address).cloned().ok_or_else(|| {
                DeployerError::TransactionFailed(format!("{method} expects an address"))
            })?;
            if let Some(contract) = state.contracts.get_mut(address) {
                contract.members.entry(set).or_default().insert(child);
            }
        }

        Ok(TxReceipt {
            transaction_hash: state.next_hash(),
            gas_used: ResourceCost(48_000),
        })
    }
}
