// ABOUTME: Config scaffolding for new deployments.
// ABOUTME: Creates banksmith.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(&Config::template());
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let base = &config.base_currency;
    let registry = &config.registry;
    let bank = config.banks.first();
    format!(
        r#"baseCurrency:
  typeCode: {}
  label: {}
  description: {}
  symbol: {}
  initialSupply: {}
  decimals: {}
  currencyCode: {}

registry:
  typeCode: {}
  label: {}
  description: {}

# Rates are decimals; quote them to keep every digit.
exchangeRates: []
#  - soCurrencyCode: USD
#    toCurrencyCode: EUR
#    rate: "0.91"

banks:
  - typeCode: {}
    label: {}
    countryCode: {}
    accounts: []
    services: {{}}
    # services:
    #   TRANSFER: {{ label: Transfers, description: Bank transfers }}

# deploy:
#   timeout: 2m
#   concurrency: 1
"#,
        base.type_code,
        base.label,
        base.description,
        base.symbol,
        base.initial_supply,
        base.decimals,
        base.currency_code,
        registry.type_code,
        registry.label,
        registry.description,
        bank.map(|b| b.type_code.as_str()).unwrap_or("BANK1"),
        bank.map(|b| b.label.as_str()).unwrap_or("First Bank"),
        bank.map(|b| b.country_code.as_str()).unwrap_or("US"),
    )
}
