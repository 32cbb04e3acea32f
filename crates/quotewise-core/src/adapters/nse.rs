use std::sync::Arc;

use serde::Deserialize;

use super::{first_positive, parse_error, send};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::provider::{ProviderError, QuoteFuture, QuoteProvider};
use crate::provider_policy::ProviderPolicy;
use crate::{ProviderId, Quote, TickerIdentifier, UtcDateTime};

const QUOTE_EQUITY_URL: &str = "https://www.nseindia.com/api/quote-equity";
const NSE_REFERER: &str = "https://www.nseindia.com/";

/// National Stock Exchange of India direct quote endpoint. NSE listings only.
#[derive(Clone)]
pub struct NseAdapter {
    http_client: Arc<dyn HttpClient>,
    policy: ProviderPolicy,
}

impl Default for NseAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(NoopHttpClient))
    }
}

impl NseAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            policy: ProviderPolicy::nse_default(),
        }
    }

    async fn fetch(&self, ticker: &TickerIdentifier) -> Result<Quote, ProviderError> {
        if ticker.exchange() != Some("NSE") {
            return Err(ProviderError::unsupported(format!(
                "nse only quotes NSE listings, got '{}'",
                ticker.canonical_form()
            )));
        }

        let endpoint = format!(
            "{QUOTE_EQUITY_URL}?symbol={}",
            urlencoding::encode(ticker.symbol())
        );
        // The endpoint rejects requests that do not look like they came from its own site.
        let request = HttpRequest::get(endpoint)
            .with_header("accept", "application/json")
            .with_header("referer", NSE_REFERER)
            .with_timeout_ms(self.policy.timeout_ms());

        let response = send(self.http_client.as_ref(), ProviderId::Nse, request).await?;
        if !response.is_success() {
            return Err(ProviderError::status(ProviderId::Nse, response.status));
        }

        let payload: NseQuoteResponse = serde_json::from_str(&response.body)
            .map_err(|e| parse_error(ProviderId::Nse, &e))?;
        let Some(price_info) = payload.price_info else {
            return Err(ProviderError::not_found(format!(
                "nse returned no price info for '{}'",
                ticker.symbol()
            )));
        };

        let price = first_positive([
            price_info.last_price,
            price_info.close,
            price_info.previous_close,
        ])
        .ok_or_else(|| {
            ProviderError::invalid_response(format!(
                "nse quote for '{}' has no usable price",
                ticker.symbol()
            ))
        })?;

        Ok(Quote::new(ticker, price, ProviderId::Nse, UtcDateTime::now())?)
    }
}

impl QuoteProvider for NseAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Nse
    }

    fn fetch_quote<'a>(&'a self, ticker: &'a TickerIdentifier) -> QuoteFuture<'a> {
        Box::pin(self.fetch(ticker))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NseQuoteResponse {
    #[serde(default)]
    price_info: Option<NsePriceInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NsePriceInfo {
    #[serde(default)]
    last_price: Option<f64>,
    #[serde(default)]
    close: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
}
