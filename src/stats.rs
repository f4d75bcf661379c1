use std::sync::atomic::{AtomicU64, Ordering};

// Process-wide counters, zero at boot, no teardown. Updated from concurrent
// handlers so all access goes through atomics.
static REQUESTS_SERVED: AtomicU64 = AtomicU64::new(0);
static SCRAPE_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn record_request() {
    REQUESTS_SERVED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_scrape_failure() {
    SCRAPE_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn requests_served() -> u64 {
    REQUESTS_SERVED.load(Ordering::Relaxed)
}

pub fn scrape_failures() -> u64 {
    SCRAPE_FAILURES.load(Ordering::Relaxed)
}
