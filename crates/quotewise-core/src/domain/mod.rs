//! # Domain Models
//!
//! Canonical domain types for quote resolution.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TickerIdentifier`] | Parsed, validated `EXCHANGE:SYMBOL` or `SYMBOL` |
//! | [`ExchangeClass`] | Routing class derived from the exchange prefix |
//! | [`ExchangeRegion`] | Regional grouping of recognized exchanges |
//! | [`Quote`] | Normalized price with provider and timestamp |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! All types validate their invariants at construction time:
//!
//! ```rust
//! use quotewise_core::{ExchangeClass, TickerIdentifier};
//!
//! let ticker = TickerIdentifier::parse("nse:reliance").unwrap();
//! assert_eq!(ticker.canonical_form(), "NSE:RELIANCE");
//! assert_eq!(ticker.class(), ExchangeClass::Indian);
//!
//! assert!(TickerIdentifier::parse("XYZ123").is_err());
//! ```

mod exchange;
mod quote;
mod ticker;
mod timestamp;

pub use exchange::{
    indian_market_suffix, is_indian_exchange, is_recognized_exchange, yahoo_international_suffix,
    ExchangeClass, ExchangeRegion,
};
pub use quote::Quote;
pub use ticker::{validate, TickerIdentifier};
pub use timestamp::UtcDateTime;
