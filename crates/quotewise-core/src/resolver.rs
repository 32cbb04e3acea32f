//! Ticker-to-quote resolution with ordered provider fallback and caching.
//!
//! [`QuoteResolver`] parses the raw ticker, consults the cache, classifies
//! the exchange, then walks a fixed provider order until one adapter returns a
//! price. Every outcome except `InvalidFormat` is cached.

use std::env;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::adapters::{AlphaVantageAdapter, NseAdapter, PolygonAdapter, YahooAdapter};
use crate::cache::{QuoteCache, DEFAULT_TTL};
use crate::clock::{Clock, SystemClock};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::provider::{ProviderErrorKind, QuoteProvider};
use crate::resolution::{
    FailureReason, Resolution, ResolutionFailure, ResolutionTrace, ResolveResponse,
};
use crate::{indian_market_suffix, ExchangeClass, ProviderId, TickerIdentifier};

/// Lifetime of a cached `RateLimited` outcome.
pub const DEFAULT_RATE_LIMIT_TTL: Duration = Duration::from_secs(60);

const ALPHAVANTAGE_KEY_VARS: [&str; 2] =
    ["QUOTEWISE_ALPHAVANTAGE_API_KEY", "ALPHAVANTAGE_API_KEY"];

/// Resolver tuning knobs.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub cache_ttl: Duration,
    pub rate_limit_ttl: Duration,
    /// Upper bound on one uncached resolution, across all providers.
    pub deadline: Option<Duration>,
    /// Real Alpha Vantage key enabling the direct-key path.
    pub alphavantage_key: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            rate_limit_ttl: DEFAULT_RATE_LIMIT_TTL,
            deadline: None,
            alphavantage_key: None,
        }
    }
}

impl Debug for ResolverConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("cache_ttl", &self.cache_ttl)
            .field("rate_limit_ttl", &self.rate_limit_ttl)
            .field("deadline", &self.deadline)
            .field(
                "alphavantage_key",
                &self.alphavantage_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl ResolverConfig {
    /// Defaults plus the Alpha Vantage key from the environment.
    ///
    /// | Primary Env Var | Fallback Env Var |
    /// |-----------------|------------------|
    /// | `QUOTEWISE_ALPHAVANTAGE_API_KEY` | `ALPHAVANTAGE_API_KEY` |
    pub fn from_env() -> Self {
        let alphavantage_key = ALPHAVANTAGE_KEY_VARS
            .iter()
            .find_map(|name| env::var(name).ok().and_then(|value| normalize_api_key(&value)));

        Self {
            alphavantage_key,
            ..Self::default()
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_rate_limit_ttl(mut self, ttl: Duration) -> Self {
        self.rate_limit_ttl = ttl;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the direct-key path key. Empty values and `demo` disable it.
    pub fn with_alphavantage_key(mut self, key: impl AsRef<str>) -> Self {
        self.alphavantage_key = normalize_api_key(key.as_ref());
        self
    }
}

fn normalize_api_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    if key.is_empty() || key.eq_ignore_ascii_case("demo") {
        None
    } else {
        Some(key.to_owned())
    }
}

/// Resolves raw ticker strings into quotes.
///
/// Cheap to share behind an `Arc`; concurrent resolutions only meet at the
/// cache.
pub struct QuoteResolver {
    international: Vec<Arc<dyn QuoteProvider>>,
    indian: Vec<Arc<dyn QuoteProvider>>,
    direct: Option<Arc<dyn QuoteProvider>>,
    cache: QuoteCache,
    rate_limit_ttl: Duration,
    deadline: Option<Duration>,
}

impl Debug for QuoteResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteResolver")
            .field("international", &provider_ids(&self.international))
            .field("indian", &provider_ids(&self.indian))
            .field("direct", &self.direct.as_ref().map(|p| p.id()))
            .field("cache", &self.cache)
            .field("rate_limit_ttl", &self.rate_limit_ttl)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl QuoteResolver {
    pub fn builder() -> QuoteResolverBuilder {
        QuoteResolverBuilder::new()
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    /// Providers an uncached resolution of `ticker` may call, in order.
    /// Empty when no provider can quote the exchange.
    pub fn route(&self, ticker: &TickerIdentifier) -> Vec<ProviderId> {
        match route_for(ticker) {
            Route::International => {
                let mut ids: Vec<_> = self.direct.iter().map(|p| p.id()).collect();
                ids.extend(provider_ids(&self.international));
                ids
            }
            Route::Indian => provider_ids(&self.indian),
            Route::Unsupported => Vec::new(),
        }
    }

    pub async fn resolve(&self, raw: &str) -> Resolution {
        self.resolve_traced(raw).await.outcome
    }

    /// Resolves `raw` and shapes the outcome for a JSON boundary.
    pub async fn resolve_response(&self, raw: &str) -> ResolveResponse {
        self.resolve(raw).await.into()
    }

    /// Resolves `raw`, also reporting cache use and the providers tried.
    pub async fn resolve_traced(&self, raw: &str) -> ResolutionTrace {
        let started = Instant::now();

        let ticker = match TickerIdentifier::parse(raw) {
            Ok(ticker) => ticker,
            Err(error) => {
                debug!(input = raw, %error, "rejected ticker");
                return ResolutionTrace {
                    outcome: Err(ResolutionFailure::invalid_format(raw.trim(), error.to_string())),
                    cache_hit: false,
                    attempted: Vec::new(),
                    latency_ms: elapsed_ms(started),
                };
            }
        };
        let key = ticker.canonical_form();

        if let Some(entry) = self.cache.get(key) {
            debug!(ticker = key, "quote cache hit");
            return ResolutionTrace {
                outcome: entry.outcome,
                cache_hit: true,
                attempted: Vec::new(),
                latency_ms: elapsed_ms(started),
            };
        }

        let mut attempted = Vec::new();
        let outcome = match self.deadline {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.fetch(&ticker, &mut attempted)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(
                            ticker = key,
                            deadline_ms = deadline.as_millis() as u64,
                            "resolution deadline elapsed"
                        );
                        Err(ResolutionFailure::all_providers_failed(
                            key,
                            format!("deadline of {}ms elapsed", deadline.as_millis()),
                        ))
                    }
                }
            }
            None => self.fetch(&ticker, &mut attempted).await,
        };

        self.store(key, &outcome);

        ResolutionTrace {
            outcome,
            cache_hit: false,
            attempted,
            latency_ms: elapsed_ms(started),
        }
    }

    fn store(&self, key: &str, outcome: &Resolution) {
        let ttl = match outcome {
            Err(failure) if failure.reason == FailureReason::RateLimited => {
                Some(self.rate_limit_ttl)
            }
            _ => None,
        };
        self.cache.set_with_ttl(key, outcome.clone(), ttl);
    }

    async fn fetch(
        &self,
        ticker: &TickerIdentifier,
        attempted: &mut Vec<ProviderId>,
    ) -> Resolution {
        let key = ticker.canonical_form();
        match route_for(ticker) {
            Route::Unsupported => {
                info!(ticker = key, "exchange is not quoted by any provider");
                Err(ResolutionFailure::not_found(
                    key,
                    "exchange is not quoted by any provider",
                ))
            }
            Route::Indian => self.walk(&self.indian, ticker, attempted).await,
            Route::International => {
                if let Some(direct) = &self.direct {
                    attempted.push(direct.id());
                    match direct.fetch_quote(ticker).await {
                        Ok(quote) => return Ok(quote),
                        Err(error) => match error.kind() {
                            ProviderErrorKind::NotFound => {
                                info!(
                                    ticker = key,
                                    code = error.code(),
                                    "direct-key lookup reported unknown symbol"
                                );
                                return Err(ResolutionFailure::not_found(key, error.message()));
                            }
                            ProviderErrorKind::RateLimited => {
                                warn!(
                                    ticker = key,
                                    code = error.code(),
                                    "direct-key lookup rate limited"
                                );
                                return Err(ResolutionFailure::rate_limited(key, error.message()));
                            }
                            _ => {
                                warn!(
                                    ticker = key,
                                    provider = %direct.id(),
                                    code = error.code(),
                                    detail = error.message(),
                                    "direct-key lookup failed; falling back to provider chain"
                                );
                            }
                        },
                    }
                }
                self.walk(&self.international, ticker, attempted).await
            }
        }
    }

    async fn walk(
        &self,
        providers: &[Arc<dyn QuoteProvider>],
        ticker: &TickerIdentifier,
        attempted: &mut Vec<ProviderId>,
    ) -> Resolution {
        let key = ticker.canonical_form();
        let mut failures = Vec::with_capacity(providers.len());

        for provider in providers {
            let id = provider.id();
            attempted.push(id);
            match provider.fetch_quote(ticker).await {
                Ok(quote) => {
                    debug!(ticker = key, provider = %id, price = quote.price, "resolved quote");
                    return Ok(quote);
                }
                Err(error) => {
                    warn!(
                        ticker = key,
                        provider = %id,
                        code = error.code(),
                        detail = error.message(),
                        "provider failed; trying next"
                    );
                    failures.push(format!("{id}: {}", error.code()));
                }
            }
        }

        warn!(ticker = key, attempts = failures.len(), "all providers failed");
        Err(ResolutionFailure::all_providers_failed(
            key,
            if failures.is_empty() {
                String::from("no providers configured")
            } else {
                failures.join(", ")
            },
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    International,
    Indian,
    Unsupported,
}

fn route_for(ticker: &TickerIdentifier) -> Route {
    match ticker.class() {
        ExchangeClass::Unclassified
        | ExchangeClass::UsMajor
        | ExchangeClass::OtherInternational => Route::International,
        ExchangeClass::Indian => match ticker.exchange().and_then(indian_market_suffix) {
            Some(_) => Route::Indian,
            None => Route::Unsupported,
        },
    }
}

fn provider_ids(providers: &[Arc<dyn QuoteProvider>]) -> Vec<ProviderId> {
    providers.iter().map(|p| p.id()).collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// Builder for [`QuoteResolver`].
///
/// Without overrides it wires the production adapters over one shared
/// [`ReqwestHttpClient`]:
///
/// | Route | Order |
/// |-------|-------|
/// | international | (direct-key Alpha Vantage), Alpha Vantage demo, Yahoo, Polygon |
/// | Indian (NSE/BSE) | Alpha Vantage demo, Yahoo, NSE |
///
/// # Example
///
/// ```rust,ignore
/// use quotewise_core::{QuoteResolverBuilder, ResolverConfig};
///
/// let resolver = QuoteResolverBuilder::new()
///     .with_config(ResolverConfig::from_env())
///     .build();
/// ```
#[derive(Default)]
pub struct QuoteResolverBuilder {
    config: ResolverConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    international: Option<Vec<Arc<dyn QuoteProvider>>>,
    indian: Option<Vec<Arc<dyn QuoteProvider>>>,
    direct: Option<Arc<dyn QuoteProvider>>,
    cache: Option<QuoteCache>,
    clock: Option<Arc<dyn Clock>>,
}

impl QuoteResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Transport shared by the default adapters.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_international_providers(mut self, providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        self.international = Some(providers);
        self
    }

    pub fn with_indian_providers(mut self, providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        self.indian = Some(providers);
        self
    }

    /// Overrides the direct-key provider that would otherwise be built from
    /// `ResolverConfig::alphavantage_key`.
    pub fn with_direct_provider(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.direct = Some(provider);
        self
    }

    pub fn with_cache(mut self, cache: QuoteCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Clock for the cache built by [`build`](Self::build). Ignored when a
    /// cache is supplied.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> QuoteResolver {
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));

        // One demo adapter on both routes so they draw on the same budget.
        let demo: Arc<dyn QuoteProvider> = Arc::new(AlphaVantageAdapter::demo(http_client.clone()));
        let yahoo: Arc<dyn QuoteProvider> =
            Arc::new(YahooAdapter::with_http_client(http_client.clone()));

        let international = self.international.unwrap_or_else(|| {
            vec![
                demo.clone(),
                yahoo.clone(),
                Arc::new(PolygonAdapter::with_http_client(http_client.clone())),
            ]
        });
        let indian = self.indian.unwrap_or_else(|| {
            vec![
                demo.clone(),
                yahoo.clone(),
                Arc::new(NseAdapter::with_http_client(http_client.clone())),
            ]
        });
        let direct = self.direct.or_else(|| {
            self.config.alphavantage_key.as_ref().map(|key| {
                Arc::new(AlphaVantageAdapter::with_api_key(http_client.clone(), key.clone()))
                    as Arc<dyn QuoteProvider>
            })
        });

        let cache = self.cache.unwrap_or_else(|| {
            let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
            QuoteCache::with_clock(self.config.cache_ttl, clock)
        });

        QuoteResolver {
            international,
            indian,
            direct,
            cache,
            rate_limit_ttl: self.config.rate_limit_ttl,
            deadline: self.config.deadline,
        }
    }
}
