use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

use super::exchange::{is_indian_exchange, is_recognized_exchange, ExchangeClass};
use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 5;
const MAX_INDIAN_SYMBOL_LEN: usize = 10;
const EXCHANGE_SEPARATOR: char = ':';

/// Parsed and validated ticker, optionally qualified with an exchange.
///
/// The canonical form (`EXCHANGE:SYMBOL` or `SYMBOL`) is the cache key used by
/// the resolver. Parsing the canonical form again yields an equal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TickerIdentifier {
    exchange: Option<String>,
    symbol: String,
    canonical_form: String,
}

impl TickerIdentifier {
    /// Trim, uppercase, split on a single `:` and validate.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }

        let (exchange, symbol) = if normalized.matches(EXCHANGE_SEPARATOR).count() == 1 {
            let (exchange, symbol) = normalized
                .split_once(EXCHANGE_SEPARATOR)
                .unwrap_or_default();
            (Some(exchange.to_owned()), symbol.to_owned())
        } else {
            (None, normalized)
        };

        validate(exchange.as_deref(), &symbol)?;

        let canonical_form = match &exchange {
            Some(exchange) => format!("{exchange}{EXCHANGE_SEPARATOR}{symbol}"),
            None => symbol.clone(),
        };

        Ok(Self {
            exchange,
            symbol,
            canonical_form,
        })
    }

    pub fn exchange(&self) -> Option<&str> {
        self.exchange.as_deref()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn canonical_form(&self) -> &str {
        &self.canonical_form
    }

    pub fn class(&self) -> ExchangeClass {
        ExchangeClass::of(self.exchange())
    }
}

/// Structural validation of an exchange/symbol pair.
///
/// Indian listings allow up to ten letters, everything else up to five. A
/// present exchange must belong to the recognized catalogue.
pub fn validate(exchange: Option<&str>, symbol: &str) -> Result<(), ValidationError> {
    let max = match exchange {
        Some("") => return Err(ValidationError::EmptyExchange),
        Some(exchange) if !is_recognized_exchange(exchange) => {
            return Err(ValidationError::UnknownExchange {
                value: exchange.to_owned(),
            });
        }
        Some(exchange) if is_indian_exchange(exchange) => MAX_INDIAN_SYMBOL_LEN,
        _ => MAX_SYMBOL_LEN,
    };

    if symbol.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }

    let len = symbol.chars().count();
    if len > max {
        return Err(ValidationError::SymbolTooLong { len, max });
    }

    if let Some((index, ch)) = symbol
        .chars()
        .enumerate()
        .find(|(_, ch)| !ch.is_ascii_uppercase())
    {
        return Err(ValidationError::SymbolInvalidChar { ch, index });
    }

    Ok(())
}

impl Display for TickerIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_form)
    }
}

impl FromStr for TickerIdentifier {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for TickerIdentifier {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
