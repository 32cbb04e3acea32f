use std::sync::Arc;

use serde::Deserialize;

use super::{first_positive, parse_error, send};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::provider::{ProviderError, QuoteFuture, QuoteProvider};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::Throttle;
use crate::{
    indian_market_suffix, is_indian_exchange, ExchangeRegion, ProviderId, Quote, TickerIdentifier,
    UtcDateTime,
};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const DEMO_API_KEY: &str = "demo";

/// Alpha Vantage `GLOBAL_QUOTE` adapter.
///
/// Built either with the public demo key (throttled locally to the free-tier
/// budget) or with a real key supplied through configuration.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    policy: ProviderPolicy,
    throttle: Option<Throttle>,
}

impl Default for AlphaVantageAdapter {
    fn default() -> Self {
        Self::demo(Arc::new(NoopHttpClient))
    }
}

impl AlphaVantageAdapter {
    pub fn demo(http_client: Arc<dyn HttpClient>) -> Self {
        let policy = ProviderPolicy::alphavantage_default();
        Self {
            http_client,
            api_key: String::from(DEMO_API_KEY),
            throttle: policy.quota.map(Throttle::new),
            policy,
        }
    }

    /// Adapter using a real key; upstream enforces the quota.
    pub fn with_api_key(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            policy: ProviderPolicy::alphavantage_default(),
            throttle: None,
        }
    }

    pub fn uses_demo_key(&self) -> bool {
        self.api_key == DEMO_API_KEY
    }

    /// Symbol as Alpha Vantage expects it: bare for US listings, `.NS`/`.BO`
    /// for Indian ones, and Alpha Vantage's own suffix elsewhere.
    fn provider_symbol(ticker: &TickerIdentifier) -> Result<String, ProviderError> {
        let symbol = ticker.symbol();
        let Some(exchange) = ticker.exchange() else {
            return Ok(symbol.to_owned());
        };
        if ExchangeRegion::of(exchange) == Some(ExchangeRegion::UnitedStates) {
            return Ok(symbol.to_owned());
        }

        let suffix = if is_indian_exchange(exchange) {
            indian_market_suffix(exchange)
        } else {
            international_suffix(exchange)
        };
        suffix
            .map(|suffix| format!("{symbol}{suffix}"))
            .ok_or_else(|| {
                ProviderError::unsupported(format!(
                    "alphavantage has no market suffix for exchange '{exchange}'"
                ))
            })
    }

    async fn fetch(&self, ticker: &TickerIdentifier) -> Result<Quote, ProviderError> {
        let symbol = Self::provider_symbol(ticker)?;

        if let Some(throttle) = &self.throttle {
            throttle.acquire().map_err(|delay| {
                ProviderError::throttled(format!(
                    "alphavantage demo-key budget exhausted; retry in {:.2}s",
                    delay.as_secs_f64()
                ))
            })?;
        }

        let endpoint = format!(
            "{BASE_URL}?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            urlencoding::encode(&symbol),
            urlencoding::encode(&self.api_key)
        );
        let request = HttpRequest::get(endpoint).with_timeout_ms(self.policy.timeout_ms());

        let response = send(self.http_client.as_ref(), ProviderId::Alphavantage, request).await?;
        if !response.is_success() {
            return Err(ProviderError::status(ProviderId::Alphavantage, response.status));
        }

        let payload: AlphaVantageQuoteResponse = serde_json::from_str(&response.body)
            .map_err(|e| parse_error(ProviderId::Alphavantage, &e))?;

        let price = payload.price(&symbol)?;
        Ok(Quote::new(
            ticker,
            price,
            ProviderId::Alphavantage,
            UtcDateTime::now(),
        )?)
    }
}

impl QuoteProvider for AlphaVantageAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Alphavantage
    }

    fn fetch_quote<'a>(&'a self, ticker: &'a TickerIdentifier) -> QuoteFuture<'a> {
        Box::pin(self.fetch(ticker))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AlphaVantageQuoteResponse {
    #[serde(rename = "Global Quote")]
    quote: Option<AlphaVantageGlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AlphaVantageGlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
}

impl AlphaVantageQuoteResponse {
    /// Alpha Vantage answers 200 for everything; the body says what happened.
    fn price(self, symbol: &str) -> Result<f64, ProviderError> {
        if let Some(message) = self.error_message {
            return Err(if rejects_symbol(&message) {
                ProviderError::not_found(format!(
                    "alphavantage rejected symbol '{symbol}': {message}"
                ))
            } else {
                ProviderError::unavailable(format!("alphavantage refused request: {message}"))
            });
        }
        if let Some(note) = self.note {
            return Err(ProviderError::rate_limited(format!(
                "alphavantage call frequency exceeded: {note}"
            )));
        }
        if let Some(information) = self.information {
            return Err(if mentions_rate_limit(&information) {
                ProviderError::rate_limited(format!("alphavantage rate limit: {information}"))
            } else {
                ProviderError::unavailable(format!("alphavantage refused request: {information}"))
            });
        }

        let quote = self.quote.unwrap_or_default();
        if quote.price.is_none() && quote.previous_close.is_none() {
            return Err(ProviderError::not_found(format!(
                "alphavantage returned no quote for '{symbol}'"
            )));
        }

        first_positive([
            parse_price(quote.price.as_deref()),
            parse_price(quote.previous_close.as_deref()),
        ])
        .ok_or_else(|| {
            ProviderError::invalid_response(format!(
                "alphavantage quote for '{symbol}' has no usable price"
            ))
        })
    }
}

fn parse_price(value: Option<&str>) -> Option<f64> {
    value.and_then(|raw| raw.trim().parse::<f64>().ok())
}

/// Listings outside the US and India that Alpha Vantage addresses by suffix.
fn international_suffix(exchange: &str) -> Option<&'static str> {
    match exchange {
        "LSE" | "LON" => Some(".LON"),
        "XETRA" | "ETR" => Some(".DEX"),
        "FRA" => Some(".FRK"),
        "EPA" => Some(".PAR"),
        "AMS" => Some(".AMS"),
        "SSE" | "SHA" => Some(".SHH"),
        "SZSE" | "SHE" => Some(".SHZ"),
        _ => None,
    }
}

/// `Error Message` also carries key problems; only a bad call is about the symbol.
fn rejects_symbol(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("apikey") || lowered.contains("api key") {
        return false;
    }
    lowered.contains("invalid api call") || lowered.contains("symbol")
}

fn mentions_rate_limit(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    ["rate limit", "call frequency", "requests per day", "per minute"]
        .iter()
        .any(|needle| lowered.contains(needle))
}
