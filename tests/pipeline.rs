// ABOUTME: Integration tests for the deployment pipeline against a simulated ledger.
// ABOUTME: Covers resumability, reconciliation, dependency ordering, holders and timeouts.

mod support;

use std::str::FromStr;
use std::time::Duration;

use banksmith::deployer::{Arg, ArtifactKind, SimulatedLedger, TimeoutDeployer, methods};
use banksmith::pipeline::{
    EntityAction, Orchestrator, PipelineError, StageErrorKind, StageKind, report_holders,
};
use banksmith::store::{FileReceiptStore, MemoryReceiptStore, ReceiptStore};
use banksmith::types::{EntityKey, TokenAmount, TypeCode};
use rust_decimal::Decimal;
use support::Fixture;

fn code(s: &str) -> TypeCode {
    TypeCode::new(s).unwrap()
}

mod resume {
    use super::*;

    #[tokio::test]
    async fn replaying_the_same_configuration_deploys_nothing_new() {
        support::init_tracing();
        let fixture = Fixture::default();
        let config = fixture.config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();

        let first = Orchestrator::new(&config, &ledger, &store).run().await.unwrap();
        assert_eq!(first.summary().created, fixture.entity_count());
        assert_eq!(ledger.deploy_count(), fixture.entity_count());
        assert_eq!(store.len(), fixture.entity_count());

        for _ in 0..2 {
            ledger.reset_calls();
            let again = Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

            assert_eq!(ledger.deploy_count(), 0);
            assert_eq!(ledger.send_count(), 0, "every edge was closed on the first run");
            assert_eq!(again.summary().skipped, fixture.entity_count());
            assert_eq!(again.summary().created, 0);
        }
    }

    #[tokio::test]
    async fn failed_second_bank_resumes_without_touching_the_first() {
        support::init_tracing();
        let fixture = Fixture {
            banks: 3,
            accounts_per_bank: 0,
            services: vec![],
            ..Fixture::default()
        };
        let config = fixture.config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();

        ledger.fail_deploys(ArtifactKind::Bank, Some(Arg::text("B2")));
        let err = Orchestrator::new(&config, &ledger, &store)
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.stage(), StageKind::Banks);
        assert_eq!(
            err.stage_error().map(|e| e.kind()),
            Some(StageErrorKind::DeploymentFailed)
        );
        assert!(store.has(&EntityKey::bank(&code("B1"))));
        assert!(!store.has(&EntityKey::bank(&code("B2"))));
        assert!(!store.has(&EntityKey::bank(&code("B3"))));
        let b1 = store.get(&EntityKey::bank(&code("B1"))).unwrap();

        ledger.clear_failures();
        ledger.reset_calls();
        let report = Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

        assert_eq!(ledger.deploy_count(), 2, "only banks 2 and 3 are deployed");
        assert_eq!(ledger.contracts_of(ArtifactKind::Bank), 3);
        assert_eq!(store.get(&EntityKey::bank(&code("B1"))).unwrap(), b1);

        let banks = &report.stages[3];
        assert_eq!(banks.kind, StageKind::Banks);
        let actions: Vec<EntityAction> = banks.outcomes.iter().map(|o| o.action).collect();
        assert_eq!(
            actions,
            vec![
                EntityAction::Skipped,
                EntityAction::Created,
                EntityAction::Created
            ]
        );
    }

    #[tokio::test]
    async fn receipts_survive_reopening_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Fixture::default().config();
        let ledger = SimulatedLedger::new();

        {
            let store = FileReceiptStore::open(dir.path()).unwrap();
            Orchestrator::new(&config, &ledger, &store).run().await.unwrap();
        }
        assert!(dir.path().join("xcoin.json").exists());
        assert!(dir.path().join("bank-account-B2-A1.json").exists());
        assert!(dir.path().join("bank-service-B1-TRANSFER.json").exists());

        ledger.reset_calls();
        let store = FileReceiptStore::open(dir.path()).unwrap();
        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();
        assert_eq!(ledger.deploy_count(), 0);
    }
}

mod reconciliation {
    use super::*;

    #[tokio::test]
    async fn unregistered_bank_gets_exactly_one_registration() {
        support::init_tracing();
        let config = Fixture {
            banks: 1,
            accounts_per_bank: 0,
            services: vec![],
            ..Fixture::default()
        }
        .config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();
        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

        let registry = store.get(&EntityKey::registry()).unwrap();
        let bank = store.get(&EntityKey::bank(&code("B1"))).unwrap();
        ledger.deregister(registry.address(), bank.address());
        ledger.reset_calls();

        let report = Orchestrator::new(&config, &ledger, &store)
            .run_stage(StageKind::Banks)
            .await
            .unwrap();

        assert_eq!(ledger.deploy_count(), 0);
        assert_eq!(ledger.send_count(), 1);
        assert_eq!(ledger.sends_of(methods::ADD_BANK), 1);
        assert!(ledger.is_registered(registry.address(), bank.address()));
        assert_eq!(report.outcomes[0].action, EntityAction::Reconciled);
        assert_eq!(report.outcomes[0].registrations, 1);
    }

    #[tokio::test]
    async fn failed_registration_keeps_the_receipt() {
        let config = Fixture {
            banks: 1,
            accounts_per_bank: 1,
            services: vec![],
            ..Fixture::default()
        }
        .config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();

        ledger.fail_sends(methods::ADD_ACCOUNT);
        let err = Orchestrator::new(&config, &ledger, &store)
            .run()
            .await
            .unwrap_err();
        assert_eq!(err.stage(), StageKind::BankAccounts);
        assert_eq!(
            err.stage_error().map(|e| e.kind()),
            Some(StageErrorKind::TransactionFailed)
        );
        let account_key = EntityKey::bank_account(&code("B1"), &code("A1"));
        assert!(store.has(&account_key));

        ledger.clear_failures();
        ledger.reset_calls();
        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();
        assert_eq!(ledger.deploy_count(), 0);
        assert_eq!(ledger.sends_of(methods::ADD_ACCOUNT), 1);
    }
}

mod ordering {
    use super::*;

    #[tokio::test]
    async fn stage_without_parent_receipts_makes_no_ledger_calls() {
        let config = Fixture::default().config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();

        let err = Orchestrator::new(&config, &ledger, &store)
            .run_stage(StageKind::Banks)
            .await
            .unwrap_err();

        match &err {
            PipelineError::Stage { stage, source } => {
                assert_eq!(*stage, StageKind::Banks);
                assert_eq!(source.kind(), StageErrorKind::MissingDependency);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ledger.calls().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn registry_is_linked_against_the_library() {
        let config = Fixture::default().config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();
        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

        let registry = store.get(&EntityKey::registry()).unwrap();
        let coin = store.get(&EntityKey::base_currency()).unwrap();
        let args = ledger.constructor_args(registry.address()).unwrap();
        assert_eq!(args[0], Arg::Address(coin.address().clone()));
        assert_eq!(registry.conf_str("typeCode"), Some("BANKS"));
    }
}

mod rates {
    use super::*;

    #[tokio::test]
    async fn rate_columns_reach_constructors_aligned_and_exact() {
        let config = Fixture::default().config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();
        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

        let decimal = |s: &str| Decimal::from_str(s).unwrap();
        let coin = store.get(&EntityKey::base_currency()).unwrap();
        let args = ledger.constructor_args(coin.address()).unwrap();
        let n = args.len();
        assert_eq!(args[n - 3], Arg::texts(["USD", "USD"]));
        assert_eq!(args[n - 2], Arg::texts(["EUR", "GBP"]));
        assert_eq!(args[n - 1], Arg::decimals(&[decimal("0.91"), decimal("0.79")]));

        let account = store
            .get(&EntityKey::bank_account(&code("B1"), &code("A2")))
            .unwrap();
        let args = ledger.constructor_args(account.address()).unwrap();
        assert_eq!(args[args.len() - 1], Arg::decimals(&[decimal("0.91"), decimal("0.79")]));

        assert_eq!(coin.conf["exchangeRates"][0]["rate"], "0.91");
    }

    #[tokio::test]
    async fn supply_beyond_u64_reaches_the_constructor_intact() {
        let supply = "100000000000000000000000000";
        let yaml = Fixture::default()
            .yaml()
            .replace("initialSupply: 1000000", &format!("initialSupply: \"{supply}\""));
        let config = banksmith::config::Config::from_yaml(&yaml).unwrap();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();
        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

        let coin = store.get(&EntityKey::base_currency()).unwrap();
        let args = ledger.constructor_args(coin.address()).unwrap();
        assert_eq!(args[4], Arg::Uint(TokenAmount::new(supply).unwrap()));
        assert_eq!(args[5], Arg::Uint(TokenAmount::from(2)));
        assert_eq!(coin.conf["initialSupply"], supply);
    }
}

mod holders {
    use super::*;

    #[tokio::test]
    async fn no_holders_means_no_queries() {
        let config = Fixture::default().config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();

        let report = report_holders(&ledger, &store, &config.auto_register_holders())
            .await
            .unwrap();

        assert!(report.is_empty());
        assert_eq!(report.to_string(), "no holder registered");
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn holders_are_registered_and_reported() {
        let fixture = Fixture {
            banks: 2,
            accounts_per_bank: 1,
            services: vec![],
            holders: vec!["alice", "bob"],
            ..Fixture::default()
        };
        let config = fixture.config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();

        let report = Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

        assert_eq!(ledger.sends_of(methods::REGISTER_ACCOUNT_BY_OWNER), 4);
        assert_eq!(report.summary().holders_registered, 4);
        let holders: Vec<&str> = report.holders.holders.iter().map(|h| h.holder.as_str()).collect();
        assert_eq!(holders, vec!["alice", "bob"]);

        let a1 = store.get(&EntityKey::bank_account(&code("B1"), &code("A1"))).unwrap();
        let a2 = store.get(&EntityKey::bank_account(&code("B2"), &code("A1"))).unwrap();
        assert_eq!(
            report.holders.holders[0].identifiers,
            vec![a1.address().to_string(), a2.address().to_string()]
        );
    }

    #[tokio::test]
    async fn holder_registration_is_resent_on_every_run() {
        let config = Fixture {
            banks: 1,
            accounts_per_bank: 1,
            services: vec![],
            holders: vec!["alice"],
            ..Fixture::default()
        }
        .config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();
        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

        ledger.reset_calls();
        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

        assert_eq!(ledger.deploy_count(), 0);
        assert_eq!(ledger.sends_of(methods::REGISTER_ACCOUNT_BY_OWNER), 1);
        assert_eq!(ledger.holder_identifiers("alice").len(), 1);
    }

    #[tokio::test]
    async fn holders_stage_alone_returns_its_report() {
        let config = Fixture {
            banks: 1,
            accounts_per_bank: 1,
            services: vec![],
            holders: vec!["alice"],
            ..Fixture::default()
        }
        .config();
        let ledger = SimulatedLedger::new();
        let store = MemoryReceiptStore::new();
        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();

        let stage = Orchestrator::new(&config, &ledger, &store)
            .run_stage(StageKind::Holders)
            .await
            .unwrap();

        assert!(stage.outcomes.is_empty());
        let holders = stage.holders.expect("holders stage carries its report");
        assert_eq!(holders.holders.len(), 1);
        assert_eq!(holders.holders[0].holder, "alice");
        let account = store.get(&EntityKey::bank_account(&code("B1"), &code("A1"))).unwrap();
        assert_eq!(holders.holders[0].identifiers, vec![account.address().to_string()]);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn waves_never_exceed_the_configured_width() {
        let fixture = Fixture {
            banks: 4,
            accounts_per_bank: 0,
            services: vec![],
            ..Fixture::default()
        };
        let config = fixture.config();
        let ledger = SimulatedLedger::new().with_latency(Duration::from_millis(20));
        let store = MemoryReceiptStore::new();

        Orchestrator::new(&config, &ledger, &store)
            .concurrency(2)
            .run()
            .await
            .unwrap();

        assert_eq!(ledger.peak_concurrency(), 2);
        assert_eq!(store.len(), fixture.entity_count());
    }

    #[tokio::test]
    async fn sequential_by_default() {
        let config = Fixture {
            banks: 3,
            ..Fixture::default()
        }
        .config();
        let ledger = SimulatedLedger::new().with_latency(Duration::from_millis(1));
        let store = MemoryReceiptStore::new();

        Orchestrator::new(&config, &ledger, &store).run().await.unwrap();
        assert_eq!(ledger.peak_concurrency(), 1);
    }
}

mod timeouts {
    use super::*;

    #[tokio::test]
    async fn slow_ledger_fails_with_a_timeout() {
        let config = Fixture::default().config();
        let ledger = SimulatedLedger::new().with_latency(Duration::from_millis(200));
        let deployer = TimeoutDeployer::new(ledger, Duration::from_millis(10));
        let store = MemoryReceiptStore::new();

        let err = Orchestrator::new(&config, &deployer, &store)
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.stage(), StageKind::BaseCurrency);
        assert_eq!(
            err.stage_error().map(|e| e.kind()),
            Some(StageErrorKind::Timeout)
        );
        assert!(store.is_empty());
    }
}
