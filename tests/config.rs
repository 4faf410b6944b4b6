// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, the legacy JSON layout, discovery and validation.

use banksmith::config::*;
use banksmith::error::Error;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
baseCurrency:
  typeCode: XCOIN
  label: Exchange Coin
  symbol: XCN
  initialSupply: 1000
  decimals: 2
  currencyCode: XCN
registry:
  typeCode: BANKS
  label: Banks
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.base_currency.type_code.as_str(), "XCOIN");
        assert_eq!(config.registry.label, "Banks");
        assert!(config.banks.is_empty());
        assert!(config.exchange_rates.is_empty());
        assert_eq!(config.deploy.timeout, Duration::from_secs(120));
        assert_eq!(config.deploy.concurrency, 1);
    }

    #[test]
    fn parse_legacy_json_layout() {
        let json = r#"{
            "typeCode": "BANKS",
            "label": "Banks",
            "description": "Registry of banks",
            "xCoin": {
                "typeCode": "XCOIN",
                "label": "XCoin",
                "description": "Exchange coin",
                "symbol": "XCN",
                "initialSupply": 1000000,
                "decimals": 2,
                "currencyCode": "XCN"
            },
            "exchangeRates": [
                { "soCurrencyCode": "USD", "toCurrencyCode": "EUR", "rate": 0.91 },
                { "soCurrencyCode": "USD", "toCurrencyCode": "GBP", "rate": 0.79 }
            ],
            "banks": [{
                "typeCode": "B1",
                "label": "Bank one",
                "description": "First bank",
                "countryCode": "US",
                "accounts": [{
                    "typeCode": "A1",
                    "label": "Checking",
                    "description": "Checking account",
                    "symbol": "CHK",
                    "initialSupply": 1000,
                    "decimals": 2,
                    "currencyCode": "USD",
                    "BIN": 411111,
                    "autoRegisters": ["alice"]
                }],
                "services": {
                    "TRANSFER": { "label": "Transfers", "description": "Wire transfers" }
                }
            }]
        }"#;

        let config = Config::from_yaml(json).unwrap();
        assert_eq!(config.registry.type_code.as_str(), "BANKS");
        assert_eq!(config.registry.description, "Registry of banks");
        assert_eq!(config.base_currency.label, "XCoin");
        assert_eq!(config.exchange_rates[0].rate, Decimal::from_str("0.91").unwrap());
        assert_eq!(config.banks[0].accounts[0].bin, "411111");
        assert_eq!(config.auto_register_holders(), vec!["alice"]);
    }

    #[test]
    fn initial_supply_accepts_uint256_strings() {
        let yaml = minimal().replace(
            "initialSupply: 1000",
            "initialSupply: \"340282366920938463463374607431768211456\"",
        );
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(
            config.base_currency.initial_supply.as_str(),
            "340282366920938463463374607431768211456"
        );
        assert_eq!(config.base_currency.initial_supply.to_u64(), None);

        let negative = minimal().replace("initialSupply: 1000", "initialSupply: \"-5\"");
        assert!(Config::from_yaml(&negative).is_err());
    }

    #[test]
    fn parse_deploy_settings() {
        let yaml = format!("{}\ndeploy:\n  timeout: 45s\n  concurrency: 4\n", minimal());
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.deploy.timeout, Duration::from_secs(45));
        assert_eq!(config.deploy.concurrency, 4);
    }

    #[test]
    fn holders_are_deduplicated_in_order() {
        let yaml = format!(
            r#"{}
banks:
  - typeCode: B1
    label: One
    countryCode: US
    accounts:
      - {{ typeCode: A1, label: a, symbol: A, initialSupply: 1, decimals: 0, currencyCode: USD, BIN: "1", autoRegisters: [carol, alice] }}
      - {{ typeCode: A2, label: b, symbol: B, initialSupply: 1, decimals: 0, currencyCode: USD, BIN: "2", autoRegisters: [alice, bob] }}
"#,
            minimal()
        );
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.auto_register_holders(), vec!["carol", "alice", "bob"]);
    }

    fn minimal() -> &'static str {
        r#"baseCurrency:
  typeCode: XCOIN
  label: Exchange Coin
  symbol: XCN
  initialSupply: 1000
  decimals: 2
  currencyCode: XCN
registry:
  typeCode: BANKS
  label: Banks"#
    }
}

mod validation {
    use super::*;

    fn with_banks(banks: &str) -> String {
        format!(
            r#"baseCurrency:
  typeCode: XCOIN
  label: Exchange Coin
  symbol: XCN
  initialSupply: 1000
  decimals: 2
  currencyCode: XCN
registry:
  typeCode: BANKS
  label: Banks
{banks}"#
        )
    }

    #[test]
    fn duplicate_bank_codes_are_rejected() {
        let yaml = with_banks(
            r#"banks:
  - { typeCode: B1, label: One, countryCode: US }
  - { typeCode: B1, label: Again, countryCode: FR }
"#,
        );
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("B1")));
    }

    #[test]
    fn accounts_rendering_the_same_receipt_key_are_rejected() {
        let yaml = with_banks(
            r#"banks:
  - typeCode: A-B
    label: First
    countryCode: US
    accounts:
      - { typeCode: C, label: c, symbol: C, initialSupply: 1, decimals: 0, currencyCode: USD, BIN: "1" }
  - typeCode: A
    label: Second
    countryCode: US
    accounts:
      - { typeCode: B-C, label: bc, symbol: D, initialSupply: 1, decimals: 0, currencyCode: USD, BIN: "2" }
"#,
        );
        let err = Config::from_yaml(&yaml).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bank-account-A-B-C"), "{message}");
        assert!(message.contains("account C of bank A-B"), "{message}");
        assert!(message.contains("account B-C of bank A"), "{message}");
    }

    #[test]
    fn bank_code_shadowing_an_account_key_is_rejected() {
        let yaml = with_banks(
            r#"banks:
  - typeCode: B1
    label: One
    countryCode: US
    accounts:
      - { typeCode: A1, label: a, symbol: A, initialSupply: 1, decimals: 0, currencyCode: USD, BIN: "1" }
  - { typeCode: account-B1-A1, label: Odd, countryCode: US }
"#,
        );
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("bank-account-B1-A1")));
    }

    #[test]
    fn invalid_type_codes_are_rejected() {
        let yaml = with_banks(
            r#"banks:
  - { typeCode: "bank one", label: One, countryCode: US }
"#,
        );
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let yaml = with_banks("deploy:\n  concurrency: 0\n");
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn self_conversion_is_rejected() {
        let yaml = with_banks(
            r#"exchangeRates:
  - { from: USD, to: USD, rate: "1" }
"#,
        );
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn registry_is_required() {
        let yaml = r#"
baseCurrency:
  typeCode: XCOIN
  label: Exchange Coin
  symbol: XCN
  initialSupply: 1000
  decimals: 2
  currencyCode: XCN
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("registry"));
    }
}

mod discovery {
    use super::*;

    #[test]
    fn prefers_yaml_over_legacy_json() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), false).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME_JSON), "{}").unwrap();

        let path = Config::locate(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(CONFIG_FILENAME));
        assert!(Config::discover(dir.path()).is_ok());
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), false).unwrap();

        assert!(matches!(
            init_config(dir.path(), false),
            Err(Error::AlreadyExists(_))
        ));
        assert!(init_config(dir.path(), true).is_ok());
    }
}

mod rates {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn projection_preserves_order_and_length(
            entries in proptest::collection::vec(("[A-Z]{3}", "[A-Z]{3}", 0u32..1_000_000u32), 0..16)
        ) {
            let rates: Vec<ExchangeRate> = entries
                .iter()
                .map(|(from, to, milli)| ExchangeRate {
                    source_currency: from.clone(),
                    target_currency: to.clone(),
                    rate: Decimal::new(i64::from(*milli), 3),
                })
                .collect();

            let columns = RateColumns::project(&rates);
            prop_assert_eq!(columns.rates.len(), rates.len());
            for (i, rate) in rates.iter().enumerate() {
                prop_assert_eq!(&columns.source_currencies[i], &rate.source_currency);
                prop_assert_eq!(&columns.target_currencies[i], &rate.target_currency);
                prop_assert_eq!(columns.rates[i], rate.rate);
            }
        }
    }
}
