//! # Quotewise Core
//!
//! Multi-source stock quote resolution.
//!
//! ## Overview
//!
//! Given a ticker in one of the accepted formats (`AAPL`, `NASDAQ:GOOGL`,
//! `nse:reliance`), this crate:
//!
//! - **Parses and validates** it into a canonical [`TickerIdentifier`]
//! - **Classifies** the exchange prefix into an [`ExchangeClass`]
//! - **Queries providers** in a fixed fallback order for that class
//! - **Caches** the outcome (quote or failure) for a bounded time
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Alpha Vantage, Yahoo, Polygon, NSE) |
//! | [`cache`] | Time-boxed outcome cache |
//! | [`clock`] | Injectable time source |
//! | [`domain`] | Ticker, exchange, quote and timestamp types |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider`] | Adapter trait and provider errors |
//! | [`provider_policy`] | Per-provider timeouts and quotas |
//! | [`resolution`] | Terminal outcomes and the public response shape |
//! | [`resolver`] | Fallback orchestration |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Client-side call budgets |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quotewise_core::{QuoteResolverBuilder, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let resolver = QuoteResolverBuilder::new()
//!         .with_config(ResolverConfig::from_env())
//!         .build();
//!
//!     match resolver.resolve("NSE:RELIANCE").await {
//!         Ok(quote) => println!("{} {:.2} via {}", quote.ticker, quote.price, quote.source),
//!         Err(failure) => eprintln!("{}", failure.reason.public_message()),
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Caller   │
//! └────────┬────────┘
//!          │ raw ticker
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ QuoteResolver   │────▶│ QuoteCache       │
//! └────────┬────────┘     └──────────────────┘
//!          │ ordered, sequential
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ QuoteProvider   │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest/none)   │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod adapters;
pub mod cache;
pub mod clock;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod provider_policy;
pub mod resolution;
pub mod resolver;
pub mod source;
pub mod throttling;

// Adapters
pub use adapters::{AlphaVantageAdapter, NseAdapter, PolygonAdapter, YahooAdapter};

// Cache
pub use cache::{CacheEntry, QuoteCache, DEFAULT_TTL};

// Clock
pub use clock::{Clock, ManualClock, SystemClock};

// Domain types
pub use domain::{
    indian_market_suffix, is_indian_exchange, is_recognized_exchange, validate,
    yahoo_international_suffix, ExchangeClass, ExchangeRegion, Quote, TickerIdentifier,
    UtcDateTime,
};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};

// Provider contract
pub use provider::{ProviderError, ProviderErrorKind, QuoteFuture, QuoteProvider};
pub use provider_policy::{ProviderPolicy, Quota};

// Resolution
pub use resolution::{
    ErrorBody, FailureReason, Resolution, ResolutionFailure, ResolutionTrace, ResolveResponse,
    ResponseBody,
};
pub use resolver::{QuoteResolver, QuoteResolverBuilder, ResolverConfig, DEFAULT_RATE_LIMIT_TTL};

// Source identifiers
pub use source::ProviderId;

// Throttling
pub use throttling::Throttle;
