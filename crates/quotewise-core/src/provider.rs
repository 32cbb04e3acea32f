//! Provider adapter contract and per-provider error type.
//!
//! Every upstream price source implements [`QuoteProvider`]. The resolver
//! holds adapters in fixed-order lists and treats any [`ProviderError`] as a
//! signal to move on to the next adapter.
//!
//! # Example
//!
//! ```rust,ignore
//! use quotewise_core::{QuoteProvider, TickerIdentifier, YahooAdapter};
//!
//! async fn price(adapter: &YahooAdapter) -> Result<f64, Box<dyn std::error::Error>> {
//!     let ticker = TickerIdentifier::parse("NSE:RELIANCE")?;
//!     let quote = adapter.fetch_quote(&ticker).await?;
//!     Ok(quote.price)
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::http_client::HttpError;
use crate::{ProviderId, Quote, TickerIdentifier, ValidationError};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Transport failure or non-2xx status.
    Unavailable,
    Timeout,
    /// Upstream explicitly reported throttling.
    RateLimited,
    /// Upstream positively reported the symbol as unknown.
    NotFound,
    /// Payload could not be parsed or carried no usable price.
    InvalidResponse,
    /// Local call budget exhausted; no upstream call was made.
    Throttled,
    /// The adapter cannot address this ticker's exchange.
    Unsupported,
    Internal,
}

/// Structured provider error used by the resolver fallback loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    retryable: bool,
}

impl ProviderError {
    fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message, true)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message, false)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidResponse, message, false)
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Throttled, message, true)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unsupported, message, false)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Internal, message, false)
    }

    /// Maps a transport error, keeping timeouts distinct.
    pub fn transport(provider: ProviderId, error: &HttpError) -> Self {
        if error.timed_out() {
            Self::timeout(format!("{provider} request timed out: {}", error.message()))
        } else {
            Self::unavailable(format!("{provider} transport error: {}", error.message()))
        }
    }

    /// Maps a non-2xx status. 404 and 429 carry meaning of their own.
    pub fn status(provider: ProviderId, status: u16) -> Self {
        match status {
            404 => Self::not_found(format!("{provider} returned status 404")),
            429 => Self::rate_limited(format!("{provider} returned status 429")),
            other => Self::unavailable(format!("{provider} upstream returned status {other}")),
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::Unavailable => "provider.unavailable",
            ProviderErrorKind::Timeout => "provider.timeout",
            ProviderErrorKind::RateLimited => "provider.rate_limited",
            ProviderErrorKind::NotFound => "provider.not_found",
            ProviderErrorKind::InvalidResponse => "provider.invalid_response",
            ProviderErrorKind::Throttled => "provider.throttled",
            ProviderErrorKind::Unsupported => "provider.unsupported",
            ProviderErrorKind::Internal => "provider.internal",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

impl From<ValidationError> for ProviderError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_response(error.to_string())
    }
}

/// Boxed future returned by [`QuoteProvider::fetch_quote`].
pub type QuoteFuture<'a> = Pin<Box<dyn Future<Output = Result<Quote, ProviderError>> + Send + 'a>>;

/// Capability every upstream price source implements.
///
/// Implementations build the provider-specific request (including any market
/// suffix), apply their own timeout, and normalize the first valid price in
/// the response into a [`Quote`]. They must never panic on bad upstream data.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// concurrent resolution.
pub trait QuoteProvider: Send + Sync {
    /// Returns the provider identifier reported as the quote `source`.
    fn id(&self) -> ProviderId;

    /// Fetches the current price for `ticker`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport failure, timeout, non-2xx
    /// status, malformed payload, missing price, or an exchange the adapter
    /// cannot address.
    fn fetch_quote<'a>(&'a self, ticker: &'a TickerIdentifier) -> QuoteFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_distinguishes_not_found_and_rate_limit() {
        assert_eq!(
            ProviderError::status(ProviderId::Yahoo, 404).kind(),
            ProviderErrorKind::NotFound
        );
        assert_eq!(
            ProviderError::status(ProviderId::Yahoo, 429).kind(),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            ProviderError::status(ProviderId::Yahoo, 503).kind(),
            ProviderErrorKind::Unavailable
        );
    }

    #[test]
    fn transport_timeouts_keep_their_kind() {
        let error = ProviderError::transport(ProviderId::Nse, &HttpError::timeout("slow"));
        assert_eq!(error.kind(), ProviderErrorKind::Timeout);
        assert!(error.retryable());
        assert_eq!(error.code(), "provider.timeout");
    }
}
