//! Terminal outcomes of a resolution and their public response shape.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CoreError, ProviderId, Quote};

/// Why a resolution ended without a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidFormat,
    NotFound,
    AllProvidersFailed,
    RateLimited,
}

impl FailureReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::NotFound => "not_found",
            Self::AllProvidersFailed => "all_providers_failed",
            Self::RateLimited => "rate_limited",
        }
    }

    /// HTTP-style status classification handed to callers.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InvalidFormat => 400,
            Self::NotFound => 404,
            Self::RateLimited => 429,
            Self::AllProvidersFailed => 500,
        }
    }

    /// Display-safe message; never carries upstream detail.
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::InvalidFormat => "Invalid ticker format",
            Self::NotFound => "Ticker not found",
            Self::AllProvidersFailed => "Unable to fetch a price from any provider",
            Self::RateLimited => "Upstream rate limit reached, retry later",
        }
    }
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated failure of one resolution. `detail` is for logs only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} for '{ticker}': {detail}")]
pub struct ResolutionFailure {
    pub ticker: String,
    pub reason: FailureReason,
    pub detail: String,
}

impl ResolutionFailure {
    pub fn new(
        ticker: impl Into<String>,
        reason: FailureReason,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            reason,
            detail: detail.into(),
        }
    }

    pub fn invalid_format(ticker: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ticker, FailureReason::InvalidFormat, detail)
    }

    pub fn not_found(ticker: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ticker, FailureReason::NotFound, detail)
    }

    pub fn rate_limited(ticker: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ticker, FailureReason::RateLimited, detail)
    }

    pub fn all_providers_failed(ticker: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ticker, FailureReason::AllProvidersFailed, detail)
    }

    pub const fn status_code(&self) -> u16 {
        self.reason.status_code()
    }
}

/// Outcome of one resolution, as stored in the cache.
pub type Resolution = Result<Quote, ResolutionFailure>;

/// Per-resolution diagnostics returned by `QuoteResolver::resolve_traced`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionTrace {
    pub outcome: Resolution,
    pub cache_hit: bool,
    /// Providers invoked for this call, in order. Empty on cache hits.
    pub attempted: Vec<ProviderId>,
    pub latency_ms: u64,
}

/// Public failure body: `{ "error": ..., "ticker": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Quote(Quote),
    Error(ErrorBody),
}

/// Boundary response consumed by callers: a status classification plus the
/// JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ResolveResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Quote(_))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.body).unwrap_or_else(|_| {
            serde_json::json!({ "error": FailureReason::AllProvidersFailed.public_message() })
        })
    }

    /// Serialized body, compact or indented.
    pub fn to_json_string(&self, pretty: bool) -> Result<String, CoreError> {
        let rendered = if pretty {
            serde_json::to_string_pretty(&self.body)?
        } else {
            serde_json::to_string(&self.body)?
        };
        Ok(rendered)
    }
}

impl From<Resolution> for ResolveResponse {
    fn from(outcome: Resolution) -> Self {
        match outcome {
            Ok(quote) => Self {
                status: 200,
                body: ResponseBody::Quote(quote),
            },
            Err(failure) => {
                let ticker = Some(failure.ticker).filter(|ticker| !ticker.trim().is_empty());
                Self {
                    status: failure.reason.status_code(),
                    body: ResponseBody::Error(ErrorBody {
                        error: failure.reason.public_message().to_owned(),
                        ticker,
                    }),
                }
            }
        }
    }
}
