use std::sync::Arc;

use serde::Deserialize;

use super::{first_positive, parse_error, send};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::provider::{ProviderError, QuoteFuture, QuoteProvider};
use crate::provider_policy::ProviderPolicy;
use crate::{
    indian_market_suffix, is_indian_exchange, yahoo_international_suffix, ExchangeRegion,
    ProviderId, Quote, TickerIdentifier, UtcDateTime,
};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart adapter.
///
/// Price precedence: `meta.regularMarketPrice`, then the last non-null daily
/// close, then `meta.chartPreviousClose`.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    policy: ProviderPolicy,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(NoopHttpClient))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            policy: ProviderPolicy::yahoo_default(),
        }
    }

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
            yahoo_international_suffix(exchange)
        };
        suffix
            .map(|suffix| format!("{symbol}{suffix}"))
            .ok_or_else(|| {
                ProviderError::unsupported(format!(
                    "yahoo has no market suffix for exchange '{exchange}'"
                ))
            })
    }

    async fn fetch(&self, ticker: &TickerIdentifier) -> Result<Quote, ProviderError> {
        let symbol = Self::provider_symbol(ticker)?;
        let endpoint = format!(
            "{CHART_URL}/{}?interval=1d&range=1d",
            urlencoding::encode(&symbol)
        );
        let request = HttpRequest::get(endpoint)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.policy.timeout_ms());

        let response = send(self.http_client.as_ref(), ProviderId::Yahoo, request).await?;
        if !response.is_success() {
            return Err(ProviderError::status(ProviderId::Yahoo, response.status));
        }

        let payload: YahooChartEnvelope = serde_json::from_str(&response.body)
            .map_err(|e| parse_error(ProviderId::Yahoo, &e))?;
        let price = payload.chart.price(&symbol)?;

        Ok(Quote::new(ticker, price, ProviderId::Yahoo, UtcDateTime::now())?)
    }
}

impl QuoteProvider for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_quote<'a>(&'a self, ticker: &'a TickerIdentifier) -> QuoteFuture<'a> {
        Box::pin(self.fetch(ticker))
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartEnvelope {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: YahooChartMeta,
    #[serde(default)]
    indicators: YahooIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooChartMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl YahooChart {
    fn price(self, symbol: &str) -> Result<f64, ProviderError> {
        if let Some(error) = self.error {
            let code = error.code.unwrap_or_default();
            let description = error.description.unwrap_or_default();
            return Err(if code.eq_ignore_ascii_case("not found") {
                ProviderError::not_found(format!(
                    "yahoo has no chart for '{symbol}': {description}"
                ))
            } else {
                ProviderError::unavailable(format!("yahoo chart error {code}: {description}"))
            });
        }

        let Some(result) = self.result.and_then(|results| results.into_iter().next()) else {
            return Err(ProviderError::not_found(format!(
                "yahoo returned an empty chart for '{symbol}'"
            )));
        };

        let last_close = result
            .indicators
            .quote
            .first()
            .and_then(|series| series.close.iter().rev().flatten().next().copied());

        first_positive([
            result.meta.regular_market_price,
            last_close,
            result.meta.chart_previous_close,
        ])
        .ok_or_else(|| {
            ProviderError::invalid_response(format!(
                "yahoo chart for '{symbol}' has no usable price"
            ))
        })
    }
}
