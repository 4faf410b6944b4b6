// ABOUTME: Exchange rate entries and their projection into constructor columns.
// ABOUTME: Rates are arbitrary-precision decimals, never floats.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One configured conversion rate between two currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    #[serde(rename = "soCurrencyCode", alias = "from")]
    pub source_currency: String,
    #[serde(rename = "toCurrencyCode", alias = "to")]
    pub target_currency: String,
    pub rate: Decimal,
}

/// The three index-aligned sequences a rate-bearing constructor takes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateColumns {
    pub source_currencies: Vec<String>,
    pub target_currencies: Vec<String>,
    pub rates: Vec<Decimal>,
}

impl RateColumns {
    /// Split a rate list into parallel columns, preserving order.
    pub fn project(rates: &[ExchangeRate]) -> Self {
        let mut columns = RateColumns {
            source_currencies: Vec::with_capacity(rates.len()),
            target_currencies: Vec::with_capacity(rates.len()),
            rates: Vec::with_capacity(rates.len()),
        };

        for rate in rates {
            columns.source_currencies.push(rate.source_currency.clone());
            columns.target_currencies.push(rate.target_currency.clone());
            columns.rates.push(rate.rate);
        }

        columns
    }
}
