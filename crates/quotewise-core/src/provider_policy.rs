use std::time::Duration;

use crate::ProviderId;

/// Per-provider call budget and request timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub timeout: Duration,
    /// Client-side quota; `None` means the provider is not throttled locally.
    pub quota: Option<Quota>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub window: Duration,
    pub limit: u32,
}

impl ProviderPolicy {
    /// Alpha Vantage free tier: five calls a minute.
    pub fn alphavantage_default() -> Self {
        Self {
            provider_id: ProviderId::Alphavantage,
            timeout: Duration::from_secs(5),
            quota: Some(Quota {
                window: Duration::from_secs(60),
                limit: 5,
            }),
        }
    }

    pub fn yahoo_default() -> Self {
        Self {
            provider_id: ProviderId::Yahoo,
            timeout: Duration::from_secs(8),
            quota: None,
        }
    }

    /// Polygon demo key: five calls a minute.
    pub fn polygon_default() -> Self {
        Self {
            provider_id: ProviderId::Polygon,
            timeout: Duration::from_secs(5),
            quota: Some(Quota {
                window: Duration::from_secs(60),
                limit: 5,
            }),
        }
    }

    pub fn nse_default() -> Self {
        Self {
            provider_id: ProviderId::Nse,
            timeout: Duration::from_secs(10),
            quota: None,
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Alphavantage => Self::alphavantage_default(),
            ProviderId::Yahoo => Self::yahoo_default(),
            ProviderId::Polygon => Self::polygon_default(),
            ProviderId::Nse => Self::nse_default(),
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis().min(u128::from(u64::MAX)) as u64
    }
}
