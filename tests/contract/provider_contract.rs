//! Contract every provider adapter must honor, checked against canned
//! upstream payloads: a valid body yields a positive price tagged with the
//! adapter's id, and every kind of bad upstream answer yields an error
//! instead of a panic.

use std::sync::Arc;

use quotewise_core::{
    AlphaVantageAdapter, HttpClient, HttpError, HttpResponse, NseAdapter, PolygonAdapter,
    ProviderErrorKind, ProviderId, QuoteProvider, TickerIdentifier, YahooAdapter,
};
use quotewise_tests::CannedHttpClient;

#[derive(Clone, Copy)]
struct ProviderCase {
    id: ProviderId,
    ticker: &'static str,
    valid_body: &'static str,
    expected_price: f64,
}

const CASES: [ProviderCase; 4] = [
    ProviderCase {
        id: ProviderId::Alphavantage,
        ticker: "NASDAQ:AAPL",
        valid_body: r#"{"Global Quote":{"01. symbol":"AAPL","05. price":"190.2500"}}"#,
        expected_price: 190.25,
    },
    ProviderCase {
        id: ProviderId::Yahoo,
        ticker: "NSE:RELIANCE",
        valid_body: r#"{"chart":{"result":[{"meta":{"regularMarketPrice":2450.75}}],"error":null}}"#,
        expected_price: 2450.75,
    },
    ProviderCase {
        id: ProviderId::Polygon,
        ticker: "NASDAQ:GOOGL",
        valid_body: r#"{"status":"OK","results":{"p":171.42}}"#,
        expected_price: 171.42,
    },
    ProviderCase {
        id: ProviderId::Nse,
        ticker: "NSE:INFY",
        valid_body: r#"{"priceInfo":{"lastPrice":1520.4}}"#,
        expected_price: 1520.4,
    },
];

fn adapter(id: ProviderId, http_client: Arc<dyn HttpClient>) -> Arc<dyn QuoteProvider> {
    match id {
        ProviderId::Alphavantage => {
            Arc::new(AlphaVantageAdapter::with_api_key(http_client, "contract"))
        }
        ProviderId::Yahoo => Arc::new(YahooAdapter::with_http_client(http_client)),
        ProviderId::Polygon => Arc::new(PolygonAdapter::with_http_client(http_client)),
        ProviderId::Nse => Arc::new(NseAdapter::with_http_client(http_client)),
    }
}

fn ticker(raw: &str) -> TickerIdentifier {
    TickerIdentifier::parse(raw).expect("valid ticker")
}

#[tokio::test]
async fn valid_payload_yields_positive_price_for_all_providers() {
    for case in CASES {
        let client = CannedHttpClient::new(Ok(HttpResponse::ok_json(case.valid_body)));
        let provider = adapter(case.id, client.clone());
        let ticker = ticker(case.ticker);

        let quote = provider
            .fetch_quote(&ticker)
            .await
            .unwrap_or_else(|error| panic!("provider '{}' failed: {error}", case.id));

        assert_eq!(provider.id(), case.id);
        assert_eq!(quote.source, case.id, "provider '{}': source", case.id);
        assert_eq!(quote.price, case.expected_price, "provider '{}': price", case.id);
        assert_eq!(quote.ticker, ticker.canonical_form(), "provider '{}': ticker", case.id);
        assert_eq!(client.request_count(), 1, "provider '{}': one call", case.id);

        let timeout = client.last_timeout_ms().expect("request recorded");
        assert!(
            (3_000..=10_000).contains(&timeout),
            "provider '{}': timeout {timeout}ms out of range",
            case.id
        );
    }
}

#[tokio::test]
async fn malformed_payload_is_an_error_for_all_providers() {
    for case in CASES {
        for body in ["", "<html>Service Unavailable</html>", "[1,2,3]", "null"] {
            let client = CannedHttpClient::new(Ok(HttpResponse::ok_json(body)));
            let provider = adapter(case.id, client);

            let result = provider.fetch_quote(&ticker(case.ticker)).await;

            assert!(
                result.is_err(),
                "provider '{}' accepted malformed body {body:?}",
                case.id
            );
        }
    }
}

#[tokio::test]
async fn non_success_status_is_an_error_for_all_providers() {
    for case in CASES {
        for status in [400_u16, 401, 403, 404, 429, 500, 502, 503] {
            let client = CannedHttpClient::new(Ok(HttpResponse::new(status, case.valid_body)));
            let provider = adapter(case.id, client);

            let error = provider
                .fetch_quote(&ticker(case.ticker))
                .await
                .expect_err("non-2xx must fail");

            let expected = match status {
                404 => ProviderErrorKind::NotFound,
                429 => ProviderErrorKind::RateLimited,
                _ => ProviderErrorKind::Unavailable,
            };
            assert_eq!(error.kind(), expected, "provider '{}' status {status}", case.id);
        }
    }
}

#[tokio::test]
async fn transport_failures_are_errors_for_all_providers() {
    for case in CASES {
        for (failure, expected) in [
            (HttpError::timeout("request timeout"), ProviderErrorKind::Timeout),
            (HttpError::new("connection refused"), ProviderErrorKind::Unavailable),
        ] {
            let client = CannedHttpClient::new(Err(failure));
            let provider = adapter(case.id, client);

            let error = provider
                .fetch_quote(&ticker(case.ticker))
                .await
                .expect_err("transport failure must fail");

            assert_eq!(error.kind(), expected, "provider '{}'", case.id);
            assert!(error.retryable());
        }
    }
}

#[tokio::test]
async fn zero_and_negative_prices_are_rejected() {
    let bodies = [
        (ProviderId::Alphavantage, r#"{"Global Quote":{"05. price":"0.0000"}}"#),
        (
            ProviderId::Yahoo,
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":-3.0}}],"error":null}}"#,
        ),
        (ProviderId::Polygon, r#"{"status":"OK","results":{"p":0}}"#),
        (ProviderId::Nse, r#"{"priceInfo":{"lastPrice":0,"close":0,"previousClose":0}}"#),
    ];

    for (id, body) in bodies {
        let case = CASES
            .iter()
            .find(|case| case.id == id)
            .expect("case exists");
        let provider = adapter(id, CannedHttpClient::new(Ok(HttpResponse::ok_json(body))));

        let error = provider
            .fetch_quote(&ticker(case.ticker))
            .await
            .expect_err("non-positive price must fail");

        assert_eq!(error.kind(), ProviderErrorKind::InvalidResponse, "provider '{id}'");
    }
}

#[tokio::test]
async fn non_us_listing_is_never_priced_as_the_bare_us_symbol() {
    let body_for = |id: ProviderId| {
        CASES
            .iter()
            .find(|case| case.id == id)
            .expect("case exists")
            .valid_body
    };

    for id in [ProviderId::Alphavantage, ProviderId::Yahoo, ProviderId::Polygon] {
        let client = CannedHttpClient::json(body_for(id));
        let provider = adapter(id, client.clone());

        let result = provider.fetch_quote(&ticker("LSE:VOD")).await;

        match result {
            Ok(quote) => {
                let url = client.last_url().expect("request recorded");
                assert!(
                    url.contains("VOD.L"),
                    "provider '{id}' quoted LSE:VOD via {url}"
                );
                assert_eq!(quote.ticker, "LSE:VOD");
            }
            Err(error) => {
                assert_eq!(error.kind(), ProviderErrorKind::Unsupported, "provider '{id}'");
                assert_eq!(client.request_count(), 0, "provider '{id}' made a call");
            }
        }
    }
}
