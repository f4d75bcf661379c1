use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Two independent budgets per client: cheap endpoints burn General points,
/// anything that drives a browser burns Scrape points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    General,
    Scrape,
}

#[derive(Debug, Clone, Copy)]
struct Quota {
    points: u32,
    window: Duration,
    block: Duration,
}

impl Tier {
    fn quota(self) -> Quota {
        match self {
            Tier::General => Quota {
                points: 10,
                window: Duration::from_secs(60),
                block: Duration::from_secs(15 * 60),
            },
            Tier::Scrape => Quota {
                points: 5,
                window: Duration::from_secs(5 * 60),
                block: Duration::from_secs(30 * 60),
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RateExceeded {
    pub retry_after_secs: u64,
}

impl fmt::Display for RateExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rate limit exceeded. Try again in {} seconds.",
            self.retry_after_secs
        )
    }
}

impl Error for RateExceeded {}

impl From<RateExceeded> for crate::domain::fault::HarvestError {
    fn from(rejected: RateExceeded) -> Self {
        crate::domain::fault::HarvestError::RateExceeded {
            retry_after_secs: rejected.retry_after_secs,
        }
    }
}

#[derive(Debug)]
struct RateBudget {
    remaining: u32,
    window_started: Instant,
    blocked_until: Option<Instant>,
}

/// Budgets are created lazily per (client key, tier) and refill on a rolling
/// window. Exhaustion blocks the key until the block duration passes; the
/// caller gets the wait surfaced, nothing queues internally.
pub struct Gatekeeper {
    budgets: Mutex<HashMap<(String, Tier), RateBudget>>,
}

impl Gatekeeper {
    pub fn new() -> Self {
        Gatekeeper {
            budgets: Mutex::new(HashMap::new()),
        }
    }

    pub fn consume(&self, client_key: &str, tier: Tier) -> Result<(), RateExceeded> {
        self.consume_at(client_key, tier, Instant::now())
    }

    // Check-and-decrement under one lock so concurrent handlers cannot both
    // see the last point and overdraw.
    fn consume_at(&self, client_key: &str, tier: Tier, now: Instant) -> Result<(), RateExceeded> {
        let quota = tier.quota();
        let mut budgets = self.budgets.lock().expect("rate budget lock poisoned");

        let budget = budgets
            .entry((client_key.to_string(), tier))
            .or_insert_with(|| RateBudget {
                remaining: quota.points,
                window_started: now,
                blocked_until: None,
            });

        if let Some(until) = budget.blocked_until {
            if now < until {
                return Err(RateExceeded {
                    retry_after_secs: secs_until(now, until),
                });
            }
            budget.blocked_until = None;
            budget.remaining = quota.points;
            budget.window_started = now;
        }

        if now.duration_since(budget.window_started) >= quota.window {
            budget.remaining = quota.points;
            budget.window_started = now;
        }

        if budget.remaining == 0 {
            let until = now + quota.block;
            budget.blocked_until = Some(until);
            log::warn!("Rate limit exhausted for {} on {:?} tier", client_key, tier);
            return Err(RateExceeded {
                retry_after_secs: secs_until(now, until),
            });
        }

        budget.remaining -= 1;
        Ok(())
    }
}

impl Default for Gatekeeper {
    fn default() -> Self {
        Gatekeeper::new()
    }
}

fn secs_until(now: Instant, until: Instant) -> u64 {
    until.duration_since(now).as_secs().max(1)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{Gatekeeper, Tier};

    #[test]
    fn scrape_tier_blocks_after_five_points() {
        let gatekeeper = Gatekeeper::new();
        let now = Instant::now();

        for _ in 0..5 {
            gatekeeper.consume_at("203.0.113.7", Tier::Scrape, now).unwrap();
        }

        let rejected = gatekeeper
            .consume_at("203.0.113.7", Tier::Scrape, now)
            .unwrap_err();
        assert!(rejected.retry_after_secs > 0);
    }

    #[test]
    fn tiers_are_independent_per_client() {
        let gatekeeper = Gatekeeper::new();
        let now = Instant::now();

        for _ in 0..5 {
            gatekeeper.consume_at("203.0.113.7", Tier::Scrape, now).unwrap();
        }

        // Scrape exhaustion leaves the general budget alone.
        gatekeeper.consume_at("203.0.113.7", Tier::General, now).unwrap();
        // And other clients are untouched entirely.
        gatekeeper.consume_at("198.51.100.2", Tier::Scrape, now).unwrap();
    }

    #[test]
    fn expired_window_refills_the_budget() {
        let gatekeeper = Gatekeeper::new();
        let start = Instant::now();

        for _ in 0..10 {
            gatekeeper.consume_at("203.0.113.7", Tier::General, start).unwrap();
        }
        assert!(gatekeeper
            .consume_at("203.0.113.7", Tier::General, start)
            .is_err());

        // The blocked key recovers once the block duration has passed.
        let later = start + Duration::from_secs(16 * 60);
        gatekeeper.consume_at("203.0.113.7", Tier::General, later).unwrap();
    }

    #[test]
    fn quiet_clients_refill_without_ever_blocking() {
        let gatekeeper = Gatekeeper::new();
        let start = Instant::now();

        for _ in 0..9 {
            gatekeeper.consume_at("203.0.113.7", Tier::General, start).unwrap();
        }

        // One point left, but the window rolls over before it is spent.
        let later = start + Duration::from_secs(61);
        for _ in 0..10 {
            gatekeeper.consume_at("203.0.113.7", Tier::General, later).unwrap();
        }
    }
}
