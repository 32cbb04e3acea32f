use std::sync::Arc;

use serde::Deserialize;

use super::{first_positive, parse_error, send};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::provider::{ProviderError, QuoteFuture, QuoteProvider};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::Throttle;
use crate::{ExchangeRegion, ProviderId, Quote, TickerIdentifier, UtcDateTime};

const LAST_TRADE_URL: &str = "https://api.polygon.io/v2/last/trade";
const DEMO_API_KEY: &str = "demo";

/// Polygon last-trade adapter on the public demo key. US listings only.
#[derive(Clone)]
pub struct PolygonAdapter {
    http_client: Arc<dyn HttpClient>,
    policy: ProviderPolicy,
    throttle: Option<Throttle>,
}

impl Default for PolygonAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(NoopHttpClient))
    }
}

impl PolygonAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        let policy = ProviderPolicy::polygon_default();
        Self {
            http_client,
            throttle: policy.quota.map(Throttle::new),
            policy,
        }
    }

    async fn fetch(&self, ticker: &TickerIdentifier) -> Result<Quote, ProviderError> {
        if let Some(exchange) = ticker
            .exchange()
            .filter(|e| ExchangeRegion::of(e) != Some(ExchangeRegion::UnitedStates))
        {
            return Err(ProviderError::unsupported(format!(
                "polygon does not quote exchange '{exchange}'"
            )));
        }

        if let Some(throttle) = &self.throttle {
            throttle.acquire().map_err(|delay| {
                ProviderError::throttled(format!(
                    "polygon demo-key budget exhausted; retry in {:.2}s",
                    delay.as_secs_f64()
                ))
            })?;
        }

        let endpoint = format!(
            "{LAST_TRADE_URL}/{}?apiKey={DEMO_API_KEY}",
            urlencoding::encode(ticker.symbol())
        );
        let request = HttpRequest::get(endpoint).with_timeout_ms(self.policy.timeout_ms());

        let response = send(self.http_client.as_ref(), ProviderId::Polygon, request).await?;
        if !response.is_success() {
            return Err(ProviderError::status(ProviderId::Polygon, response.status));
        }

        let payload: PolygonLastTradeResponse = serde_json::from_str(&response.body)
            .map_err(|e| parse_error(ProviderId::Polygon, &e))?;
        let price = payload.price(ticker.symbol())?;

        Ok(Quote::new(ticker, price, ProviderId::Polygon, UtcDateTime::now())?)
    }
}

impl QuoteProvider for PolygonAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Polygon
    }

    fn fetch_quote<'a>(&'a self, ticker: &'a TickerIdentifier) -> QuoteFuture<'a> {
        Box::pin(self.fetch(ticker))
    }
}

#[derive(Debug, Deserialize)]
struct PolygonLastTradeResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    results: Option<PolygonTrade>,
    /// Legacy v1 shape.
    #[serde(default)]
    last: Option<PolygonLegacyTrade>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PolygonTrade {
    #[serde(rename = "p")]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PolygonLegacyTrade {
    price: Option<f64>,
}

impl PolygonLastTradeResponse {
    fn price(self, symbol: &str) -> Result<f64, ProviderError> {
        let status = self.status.unwrap_or_default().to_ascii_uppercase();
        let detail = self.error.or(self.message).unwrap_or_default();

        match status.as_str() {
            "NOT_FOUND" => {
                return Err(ProviderError::not_found(format!(
                    "polygon has no trades for '{symbol}': {detail}"
                )))
            }
            "ERROR" | "NOT_AUTHORIZED" | "DELAYED" if self.results.is_none() => {
                return Err(ProviderError::unavailable(format!(
                    "polygon refused request ({status}): {detail}"
                )))
            }
            _ => {}
        }

        first_positive([
            self.results.and_then(|trade| trade.price),
            self.last.and_then(|trade| trade.price),
        ])
        .ok_or_else(|| {
            ProviderError::invalid_response(format!(
                "polygon last trade for '{symbol}' has no usable price"
            ))
        })
    }
}
