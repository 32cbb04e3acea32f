//! Behavior-driven tests for quote resolution
//!
//! These tests verify HOW the resolver orders providers, routes by exchange,
//! caches outcomes, and shapes its public response, using stub providers so
//! no test touches the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quotewise_core::{
    AlphaVantageAdapter, ExchangeClass, FailureReason, ManualClock, ProviderError, ProviderId,
    Quote, QuoteCache, QuoteFuture, QuoteProvider, QuoteResolver, QuoteResolverBuilder,
    ResolverConfig, TickerIdentifier, UtcDateTime,
};
use quotewise_tests::CannedHttpClient;

// =============================================================================
// Test doubles
// =============================================================================

struct StubProvider {
    id: ProviderId,
    outcome: Result<f64, ProviderError>,
    calls: AtomicUsize,
}

impl StubProvider {
    fn pricing(id: ProviderId, price: f64) -> Arc<Self> {
        Arc::new(Self {
            id,
            outcome: Ok(price),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(id: ProviderId, error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            id,
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    fn unavailable(id: ProviderId) -> Arc<Self> {
        Self::failing(id, ProviderError::unavailable("upstream returned status 503"))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QuoteProvider for StubProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn fetch_quote<'a>(&'a self, ticker: &'a TickerIdentifier) -> QuoteFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.clone();
        Box::pin(async move {
            let price = outcome?;
            Ok(Quote::new(ticker, price, self.id, UtcDateTime::now())?)
        })
    }
}

struct Chains {
    international: [Arc<StubProvider>; 3],
    indian: [Arc<StubProvider>; 3],
}

impl Chains {
    fn all_failing() -> Self {
        Self::new(
            [
                StubProvider::unavailable(ProviderId::Alphavantage),
                StubProvider::unavailable(ProviderId::Yahoo),
                StubProvider::unavailable(ProviderId::Polygon),
            ],
            [
                StubProvider::unavailable(ProviderId::Alphavantage),
                StubProvider::unavailable(ProviderId::Yahoo),
                StubProvider::unavailable(ProviderId::Nse),
            ],
        )
    }

    fn new(international: [Arc<StubProvider>; 3], indian: [Arc<StubProvider>; 3]) -> Self {
        Self {
            international,
            indian,
        }
    }

    fn builder(&self) -> QuoteResolverBuilder {
        QuoteResolverBuilder::new()
            .with_international_providers(as_providers(&self.international))
            .with_indian_providers(as_providers(&self.indian))
    }

    fn total_calls(&self) -> usize {
        self.international
            .iter()
            .chain(self.indian.iter())
            .map(|p| p.calls())
            .sum()
    }

    fn international_calls(&self) -> [usize; 3] {
        self.international.each_ref().map(|p| p.calls())
    }

    fn indian_calls(&self) -> [usize; 3] {
        self.indian.each_ref().map(|p| p.calls())
    }
}

fn as_providers(stubs: &[Arc<StubProvider>]) -> Vec<Arc<dyn QuoteProvider>> {
    stubs
        .iter()
        .map(|stub| Arc::clone(stub) as Arc<dyn QuoteProvider>)
        .collect()
}

fn start() -> UtcDateTime {
    UtcDateTime::parse("2024-06-03T09:30:00Z").expect("valid timestamp")
}

fn resolver_with_clock(chains: &Chains) -> (QuoteResolver, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let resolver = chains.builder().with_clock(clock.clone()).build();
    (resolver, clock)
}

// =============================================================================
// Parsing and validation
// =============================================================================

#[test]
fn when_canonical_form_is_reparsed_system_returns_same_identifier() {
    // Given: Tickers in every accepted shape
    for raw in ["AAPL", " aapl ", "NASDAQ:GOOGL", "nse:reliance", "BSE:TCS", "LSE:SHEL"] {
        // When: The canonical form is parsed again
        let first = TickerIdentifier::parse(raw).expect("valid ticker");
        let second = TickerIdentifier::parse(first.canonical_form()).expect("canonical reparses");

        // Then: Both parses agree
        assert_eq!(first, second, "round trip for '{raw}'");
    }
}

#[test]
fn when_ticker_has_exchange_prefix_system_classifies_it() {
    let class = |raw: &str| TickerIdentifier::parse(raw).expect("valid").class();

    assert_eq!(class("AAPL"), ExchangeClass::Unclassified);
    assert_eq!(class("NYSE:IBM"), ExchangeClass::UsMajor);
    assert_eq!(class("NSE:RELIANCE"), ExchangeClass::Indian);
    assert_eq!(class("MCX:GOLD"), ExchangeClass::Indian);
    assert_eq!(class("XETRA:SAP"), ExchangeClass::OtherInternational);
}

#[tokio::test]
async fn when_ticker_is_malformed_system_fails_without_provider_calls() {
    // Given: A resolver with counting providers
    let chains = Chains::all_failing();
    let resolver = chains.builder().build();

    for raw in ["XYZ123", "", "   ", "NSE:", ":AAPL", "FOO:BAR", "A:B:C", "BRK.B"] {
        // When: A malformed ticker is resolved
        let failure = resolver.resolve(raw).await.expect_err("must be rejected");

        // Then: It is an invalid-format failure
        assert_eq!(failure.reason, FailureReason::InvalidFormat, "input '{raw}'");
        assert_eq!(failure.status_code(), 400);
    }

    // And: No provider was called and nothing was cached
    assert_eq!(chains.total_calls(), 0);
    assert!(resolver.cache().is_empty());
}

#[tokio::test]
async fn when_indian_symbol_is_long_system_accepts_up_to_ten_letters() {
    // Given: A resolver whose Indian chain prices everything
    let chains = Chains::new(
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Polygon),
        ],
        [
            StubProvider::pricing(ProviderId::Alphavantage, 1520.4),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Nse),
        ],
    );
    let resolver = chains.builder().build();

    // When / Then: A ten-letter NSE symbol resolves, an unprefixed one does not
    assert!(resolver.resolve("NSE:BAJFINANCE").await.is_ok());
    assert_eq!(
        resolver.resolve("BAJFINANCE").await.expect_err("too long").reason,
        FailureReason::InvalidFormat
    );
}

// =============================================================================
// Fallback ordering
// =============================================================================

#[tokio::test]
async fn when_first_provider_fails_system_uses_second_and_skips_third() {
    // Given: A fails, B prices, C would price too
    let chains = Chains::new(
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::pricing(ProviderId::Yahoo, 190.25),
            StubProvider::pricing(ProviderId::Polygon, 1.0),
        ],
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Nse),
        ],
    );
    let resolver = chains.builder().build();

    // When: AAPL is resolved
    let trace = resolver.resolve_traced("AAPL").await;

    // Then: B's quote is returned, A was tried once and C never
    let quote = trace.outcome.expect("quote");
    assert_eq!(quote.price, 190.25);
    assert_eq!(quote.source, ProviderId::Yahoo);
    assert_eq!(chains.international_calls(), [1, 1, 0]);
    assert_eq!(trace.attempted, vec![ProviderId::Alphavantage, ProviderId::Yahoo]);
    assert!(!trace.cache_hit);
}

#[tokio::test]
async fn when_every_provider_fails_system_reports_and_caches_exhaustion() {
    // Given: All three international providers fail
    let chains = Chains::all_failing();
    let (resolver, clock) = resolver_with_clock(&chains);

    // When: NASDAQ:GOOGL is resolved
    let failure = resolver
        .resolve("NASDAQ:GOOGL")
        .await
        .expect_err("nothing can price it");

    // Then: The failure is terminal and each provider was tried once
    assert_eq!(failure.reason, FailureReason::AllProvidersFailed);
    assert_eq!(failure.ticker, "NASDAQ:GOOGL");
    assert_eq!(chains.international_calls(), [1, 1, 1]);

    // And: A repeat within five minutes is served from cache
    clock.advance(Duration::from_secs(4 * 60));
    let trace = resolver.resolve_traced("nasdaq:googl").await;
    assert!(trace.cache_hit);
    assert_eq!(trace.outcome.expect_err("cached failure"), failure);
    assert_eq!(chains.international_calls(), [1, 1, 1]);

    // And: The public response hides provider detail
    let response = resolver.resolve_response("NASDAQ:GOOGL").await;
    assert_eq!(response.status, 500);
    assert_eq!(
        response.to_json(),
        serde_json::json!({
            "error": "Unable to fetch a price from any provider",
            "ticker": "NASDAQ:GOOGL",
        })
    );
}

// =============================================================================
// Exchange routing
// =============================================================================

#[tokio::test]
async fn when_nse_ticker_is_resolved_system_only_uses_indian_chain() {
    // Given: Every provider fails
    let chains = Chains::all_failing();
    let resolver = chains.builder().build();

    // When: NSE:RELIANCE is resolved
    let trace = resolver.resolve_traced("NSE:RELIANCE").await;

    // Then: Only the Indian chain was invoked, in order
    assert_eq!(
        trace.outcome.expect_err("all fail").reason,
        FailureReason::AllProvidersFailed
    );
    assert_eq!(chains.indian_calls(), [1, 1, 1]);
    assert_eq!(chains.international_calls(), [0, 0, 0]);
    assert_eq!(
        trace.attempted,
        vec![ProviderId::Alphavantage, ProviderId::Yahoo, ProviderId::Nse]
    );
}

#[tokio::test]
async fn when_lowercase_nse_ticker_resolves_system_returns_public_quote_shape() {
    // Given: The first Indian provider prices RELIANCE
    let chains = Chains::new(
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Polygon),
        ],
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::pricing(ProviderId::Yahoo, 2450.75),
            StubProvider::unavailable(ProviderId::Nse),
        ],
    );
    let resolver = chains.builder().build();

    // When: The user types it in lowercase
    let response = resolver.resolve_response("nse:reliance").await;

    // Then: The normalized quote is returned
    assert_eq!(response.status, 200);
    let json = response.to_json();
    assert_eq!(json["ticker"], "NSE:RELIANCE");
    assert_eq!(json["symbol"], "RELIANCE");
    assert_eq!(json["exchange"], "NSE");
    assert_eq!(json["price"], 2450.75);
    assert_eq!(json["source"], "yahoo");
    let last_updated = json["lastUpdated"].as_str().expect("timestamp string");
    assert!(UtcDateTime::parse(last_updated).is_ok());
}

#[tokio::test]
async fn when_commodity_exchange_is_requested_system_reports_not_found_without_calls() {
    // Given: A resolver with counting providers
    let chains = Chains::all_failing();
    let resolver = chains.builder().build();

    // When: A recognized but unquoted exchange is requested twice
    let first = resolver.resolve("MCX:GOLD").await.expect_err("unquoted");
    let second = resolver.resolve_traced("MCX:GOLD").await;

    // Then: It is not found, cached, and no provider was called
    assert_eq!(first.reason, FailureReason::NotFound);
    assert_eq!(first.status_code(), 404);
    assert!(second.cache_hit);
    assert_eq!(chains.total_calls(), 0);
}

#[tokio::test]
async fn when_bare_ticker_is_resolved_system_reports_null_exchange() {
    let chains = Chains::new(
        [
            StubProvider::pricing(ProviderId::Alphavantage, 145.09),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Polygon),
        ],
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Nse),
        ],
    );
    let resolver = chains.builder().build();

    let json = resolver.resolve_response("IBM").await.to_json();

    assert_eq!(json["ticker"], "IBM");
    assert!(json["exchange"].is_null());
    assert_eq!(json["source"], "alphavantage");
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test]
async fn when_ticker_is_resolved_twice_within_ttl_system_serves_cached_quote() {
    // Given: A resolver whose second provider prices AAPL
    let chains = Chains::new(
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::pricing(ProviderId::Yahoo, 190.25),
            StubProvider::unavailable(ProviderId::Polygon),
        ],
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Nse),
        ],
    );
    let (resolver, clock) = resolver_with_clock(&chains);

    // When: AAPL is resolved, then again shortly after
    let first = resolver.resolve("AAPL").await.expect("quote");
    clock.advance(Duration::from_secs(299));
    let second = resolver.resolve_traced("AAPL").await;

    // Then: The identical quote comes back with no further calls
    assert!(second.cache_hit);
    assert!(second.attempted.is_empty());
    assert_eq!(second.outcome.expect("cached quote"), first);
    assert_eq!(chains.total_calls(), 2);
}

#[tokio::test]
async fn when_ttl_elapses_system_queries_providers_again() {
    // Given: A cached AAPL quote
    let chains = Chains::new(
        [
            StubProvider::pricing(ProviderId::Alphavantage, 190.25),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Polygon),
        ],
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Nse),
        ],
    );
    let (resolver, clock) = resolver_with_clock(&chains);
    resolver.resolve("AAPL").await.expect("quote");

    // When: Exactly the TTL passes
    clock.advance(Duration::from_secs(300));
    let trace = resolver.resolve_traced("AAPL").await;

    // Then: The entry is expired and the provider is asked again
    assert!(!trace.cache_hit);
    assert_eq!(chains.international_calls(), [2, 0, 0]);
}

#[tokio::test]
async fn when_cache_is_disabled_system_always_queries_providers() {
    let chains = Chains::all_failing();
    let resolver = chains.builder().with_cache(QuoteCache::disabled()).build();

    resolver.resolve("AAPL").await.expect_err("all fail");
    resolver.resolve("AAPL").await.expect_err("all fail");

    assert_eq!(chains.international_calls(), [2, 2, 2]);
}

#[tokio::test]
async fn when_many_tickers_resolve_concurrently_system_answers_each() {
    // Given: A shared resolver whose last provider prices everything
    let chains = Chains::new(
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::pricing(ProviderId::Polygon, 42.0),
        ],
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::pricing(ProviderId::Nse, 99.0),
        ],
    );
    let resolver = Arc::new(chains.builder().build());
    let tickers = ["AAPL", "MSFT", "NYSE:IBM", "NSE:INFY", "NSE:TCS", "LSE:SHEL"];

    // When: They are resolved at the same time
    let handles: Vec<_> = tickers
        .iter()
        .map(|raw| {
            let resolver = Arc::clone(&resolver);
            let raw = (*raw).to_owned();
            tokio::spawn(async move { resolver.resolve(&raw).await })
        })
        .collect();

    // Then: Every ticker gets its own quote from its own route
    for (raw, handle) in tickers.iter().zip(handles) {
        let quote = handle.await.expect("task joins").expect("quote");
        let expected = TickerIdentifier::parse(raw).expect("valid");
        assert_eq!(quote.ticker, expected.canonical_form());
        let source = if raw.starts_with("NSE:") {
            ProviderId::Nse
        } else {
            ProviderId::Polygon
        };
        assert_eq!(quote.source, source);
    }
    assert_eq!(resolver.cache().len(), tickers.len());
}

// =============================================================================
// Direct-key path
// =============================================================================

fn direct_builder(chains: &Chains, direct: Arc<StubProvider>) -> QuoteResolverBuilder {
    chains.builder().with_direct_provider(direct)
}

#[tokio::test]
async fn when_direct_key_reports_unknown_symbol_system_skips_the_chain() {
    // Given: A configured key whose lookup says the symbol does not exist
    let chains = Chains::all_failing();
    let direct = StubProvider::failing(
        ProviderId::Alphavantage,
        ProviderError::not_found("Invalid API call"),
    );
    let resolver = direct_builder(&chains, direct.clone()).build();

    // When: The ticker is resolved
    let failure = resolver.resolve("ZZZZ").await.expect_err("unknown");

    // Then: NotFound returns immediately and is cached
    assert_eq!(failure.reason, FailureReason::NotFound);
    assert_eq!(direct.calls(), 1);
    assert_eq!(chains.total_calls(), 0);
    assert!(resolver.resolve_traced("ZZZZ").await.cache_hit);
}

#[tokio::test]
async fn when_direct_key_is_rate_limited_system_surfaces_it() {
    // Given: A configured key whose upstream reports throttling
    let chains = Chains::all_failing();
    let direct = StubProvider::failing(
        ProviderId::Alphavantage,
        ProviderError::rate_limited("Our standard API call frequency is 5 calls per minute"),
    );
    let resolver = direct_builder(&chains, direct)
        .with_config(ResolverConfig::default().with_rate_limit_ttl(Duration::from_secs(30)))
        .build();

    // When: The ticker is resolved
    let response = resolver.resolve_response("AAPL").await;

    // Then: A distinct rate-limit response comes back without touching the chain
    assert_eq!(response.status, 429);
    assert_eq!(chains.total_calls(), 0);
    let entry = resolver.cache().get("AAPL").expect("cached");
    assert_eq!(entry.ttl(), Duration::from_secs(30));
}

#[tokio::test]
async fn when_direct_key_fails_otherwise_system_falls_through_to_chain() {
    // Given: A configured key that times out, and a chain whose B prices
    let chains = Chains::new(
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::pricing(ProviderId::Yahoo, 320.5),
            StubProvider::unavailable(ProviderId::Polygon),
        ],
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Nse),
        ],
    );
    for error in [
        ProviderError::timeout("request timed out"),
        ProviderError::throttled("local budget exhausted"),
        ProviderError::invalid_response("no usable price"),
    ] {
        let direct = StubProvider::failing(ProviderId::Alphavantage, error);
        let resolver = direct_builder(&chains, direct.clone()).build();

        // When: The ticker is resolved
        let trace = resolver.resolve_traced("MSFT").await;

        // Then: The full chain runs after the direct attempt
        assert_eq!(trace.outcome.expect("chain quote").price, 320.5);
        assert_eq!(direct.calls(), 1);
        assert_eq!(
            trace.attempted,
            vec![ProviderId::Alphavantage, ProviderId::Alphavantage, ProviderId::Yahoo]
        );
    }
}

#[tokio::test]
async fn when_direct_key_exists_system_does_not_use_it_for_indian_tickers() {
    let chains = Chains::all_failing();
    let direct = StubProvider::pricing(ProviderId::Alphavantage, 1.0);
    let resolver = direct_builder(&chains, direct.clone()).build();

    let failure = resolver.resolve("BSE:TCS").await.expect_err("indian chain fails");

    assert_eq!(failure.reason, FailureReason::AllProvidersFailed);
    assert_eq!(direct.calls(), 0);
    assert_eq!(chains.indian_calls(), [1, 1, 1]);
}

#[tokio::test]
async fn when_direct_key_succeeds_system_returns_its_quote() {
    let chains = Chains::all_failing();
    let direct = StubProvider::pricing(ProviderId::Alphavantage, 411.22);
    let resolver = direct_builder(&chains, direct).build();

    let quote = resolver.resolve("NASDAQ:MSFT").await.expect("direct quote");

    assert_eq!(quote.price, 411.22);
    assert_eq!(chains.total_calls(), 0);
}

#[tokio::test]
async fn when_direct_key_is_rejected_system_still_walks_the_chain() {
    // Given: A configured key that Alpha Vantage rejects as invalid
    let http = CannedHttpClient::json(
        r#"{"Error Message":"the parameter apikey is invalid or missing. Please claim your free API key on (https://www.alphavantage.co/support/#api-key). It should take less than 20 seconds."}"#,
    );
    let direct = Arc::new(AlphaVantageAdapter::with_api_key(http.clone(), "not-a-key"));
    let chains = Chains::new(
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::pricing(ProviderId::Yahoo, 190.5),
            StubProvider::unavailable(ProviderId::Polygon),
        ],
        [
            StubProvider::unavailable(ProviderId::Alphavantage),
            StubProvider::unavailable(ProviderId::Yahoo),
            StubProvider::unavailable(ProviderId::Nse),
        ],
    );
    let resolver = chains.builder().with_direct_provider(direct).build();

    // When: An international ticker is resolved
    let trace = resolver.resolve_traced("AAPL").await;

    // Then: The key failure is not mistaken for an unknown symbol
    assert_eq!(trace.outcome.expect("chain quote").price, 190.5);
    assert_eq!(http.request_count(), 1);
    assert_eq!(chains.international_calls(), [1, 1, 0]);
    assert_eq!(
        trace.attempted,
        vec![ProviderId::Alphavantage, ProviderId::Alphavantage, ProviderId::Yahoo]
    );
}
