use serde::{Deserialize, Serialize};

use crate::{ProviderId, TickerIdentifier, UtcDateTime, ValidationError};

/// Normalized price observation for one ticker.
///
/// Serializes to the resolver's public success shape:
/// `{ticker, symbol, exchange, price, source, lastUpdated}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub ticker: String,
    pub symbol: String,
    pub exchange: Option<String>,
    pub price: f64,
    pub source: ProviderId,
    pub last_updated: UtcDateTime,
}

impl Quote {
    pub fn new(
        ticker: &TickerIdentifier,
        price: f64,
        source: ProviderId,
        last_updated: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        validate_positive("price", price)?;

        Ok(Self {
            ticker: ticker.canonical_form().to_owned(),
            symbol: ticker.symbol().to_owned(),
            exchange: ticker.exchange().map(str::to_owned),
            price,
            source,
            last_updated,
        })
    }
}

fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveValue { field });
    }
    Ok(())
}
