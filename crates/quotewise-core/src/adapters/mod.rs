//! Upstream price provider adapters.
//!
//! | Adapter | Endpoint | Routes |
//! |---------|----------|--------|
//! | [`AlphaVantageAdapter`] | `GLOBAL_QUOTE` | international, Indian (`.NS`/`.BO`) |
//! | [`YahooAdapter`] | `v8/finance/chart` | international, Indian (`.NS`/`.BO`) |
//! | [`PolygonAdapter`] | `v2/last/trade` | international |
//! | [`NseAdapter`] | `api/quote-equity` | Indian (NSE only) |

mod alphavantage;
mod nse;
mod polygon;
mod yahoo;

pub use alphavantage::AlphaVantageAdapter;
pub use nse::NseAdapter;
pub use polygon::PolygonAdapter;
pub use yahoo::YahooAdapter;

use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::provider::ProviderError;
use crate::ProviderId;

/// Executes `request`, mapping transport failures onto [`ProviderError`].
async fn send(
    http_client: &dyn HttpClient,
    provider: ProviderId,
    request: HttpRequest,
) -> Result<HttpResponse, ProviderError> {
    http_client
        .execute(request)
        .await
        .map_err(|error| ProviderError::transport(provider, &error))
}

/// First finite, strictly positive candidate.
fn first_positive<I>(candidates: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|value| value.is_finite() && *value > 0.0)
}

fn parse_error(provider: ProviderId, error: &serde_json::Error) -> ProviderError {
    ProviderError::invalid_response(format!("failed to parse {provider} response: {error}"))
}
