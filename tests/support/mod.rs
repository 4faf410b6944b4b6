// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and generated deployment configurations.

use std::fmt::Write;
use std::sync::Once;

use banksmith::config::Config;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("banksmith=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Shape of a generated configuration.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Fixture {
    pub banks: usize,
    pub accounts_per_bank: usize,
    pub services: Vec<&'static str>,
    /// Holders auto-registered on the first account of every bank.
    pub holders: Vec<&'static str>,
    pub concurrency: usize,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            banks: 2,
            accounts_per_bank: 2,
            services: vec!["TRANSFER"],
            holders: vec![],
            concurrency: 1,
        }
    }
}

#[allow(dead_code)]
impl Fixture {
    pub fn yaml(&self) -> String {
        let mut yaml = String::from(
            r#"baseCurrency:
  typeCode: XCOIN
  label: Exchange Coin
  description: Settlement currency
  symbol: XCN
  initialSupply: 1000000
  decimals: 2
  currencyCode: XCN
registry:
  typeCode: BANKS
  label: Banks
  description: Bank registry
exchangeRates:
  - soCurrencyCode: USD
    toCurrencyCode: EUR
    rate: "0.91"
  - soCurrencyCode: USD
    toCurrencyCode: GBP
    rate: "0.79"
banks:
"#,
        );

        for b in 1..=self.banks {
            writeln!(yaml, "  - typeCode: B{b}").unwrap();
            writeln!(yaml, "    label: Bank {b}").unwrap();
            writeln!(yaml, "    countryCode: US").unwrap();
            writeln!(yaml, "    accounts:").unwrap();
            for a in 1..=self.accounts_per_bank {
                writeln!(yaml, "      - typeCode: A{a}").unwrap();
                writeln!(yaml, "        label: Account {a}").unwrap();
                writeln!(yaml, "        symbol: AC{a}").unwrap();
                writeln!(yaml, "        initialSupply: 5000").unwrap();
                writeln!(yaml, "        decimals: 2").unwrap();
                writeln!(yaml, "        currencyCode: USD").unwrap();
                writeln!(yaml, "        BIN: \"4{b:02}{a:03}\"").unwrap();
                if a == 1 && !self.holders.is_empty() {
                    writeln!(yaml, "        autoRegisters: [{}]", self.holders.join(", ")).unwrap();
                }
            }
            if self.accounts_per_bank == 0 {
                yaml.truncate(yaml.len() - "    accounts:\n".len());
            }
            if self.services.is_empty() {
                continue;
            }
            writeln!(yaml, "    services:").unwrap();
            for service in &self.services {
                writeln!(yaml, "      {service}:").unwrap();
                writeln!(yaml, "        label: {service} service").unwrap();
            }
        }

        writeln!(yaml, "deploy:").unwrap();
        writeln!(yaml, "  timeout: 5s").unwrap();
        writeln!(yaml, "  concurrency: {}", self.concurrency).unwrap();
        yaml
    }

    pub fn config(&self) -> Config {
        Config::from_yaml(&self.yaml()).unwrap()
    }

    /// Entities the pipeline deploys for this fixture.
    pub fn entity_count(&self) -> usize {
        3 + self.banks * (1 + self.accounts_per_bank + self.services.len())
    }
}
