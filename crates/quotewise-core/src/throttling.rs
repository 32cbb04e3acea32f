use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock as _, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota as GovernorQuota, RateLimiter};

use crate::provider_policy::Quota;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side call budget for demo-tier provider keys.
///
/// Exhausting the budget is reported back to the adapter, which fails fast
/// instead of spending an upstream call that would be refused anyway.
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<DirectRateLimiter>,
}

impl Throttle {
    pub fn new(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota.window,
                quota.limit,
            ))),
        }
    }

    /// Takes one unit of budget, or returns how long until one is available.
    pub fn acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }
}

fn quota_from_window(window: Duration, limit: u32) -> GovernorQuota {
    let burst = NonZeroU32::new(limit.max(1)).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    GovernorQuota::with_period(period)
        .unwrap_or_else(|| GovernorQuota::per_second(burst))
        .allow_burst(burst)
}
