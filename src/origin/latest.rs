//! `latest` alias resolution
//!
//! The origin publishes one archive per day named `YYYYMMDD.pmtiles`. The
//! newest one is found by probing today and the seven preceding days, newest
//! first. Calendar days are UTC, both for the candidates and for deciding when
//! the memoized answer goes stale.

use super::ExistenceProbe;
use crate::logger;
use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tile name that resolves to the newest dated build
pub const LATEST_ALIAS: &str = "latest.pmtiles";

/// Number of calendar days probed, today included
pub const LOOKBACK_DAYS: u64 = 8;

#[derive(Debug, Default, Clone)]
struct Resolution {
    resolved: Option<String>,
    resolved_on: Option<NaiveDate>,
}

/// Source of "today" for resolution
pub type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Maps `latest` to a dated archive, memoized per calendar day
pub struct LatestResolver {
    probe: Arc<dyn ExistenceProbe>,
    clock: Clock,
    memo: RwLock<Resolution>,
}

impl LatestResolver {
    pub fn new(probe: Arc<dyn ExistenceProbe>) -> Self {
        Self::with_clock(probe, Box::new(|| Utc::now().date_naive()))
    }

    pub fn with_clock(probe: Arc<dyn ExistenceProbe>, clock: Clock) -> Self {
        Self {
            probe,
            clock,
            memo: RwLock::new(Resolution::default()),
        }
    }

    /// Resolve against the current day
    pub async fn resolve(&self) -> Option<String> {
        self.resolve_on((self.clock)()).await
    }

    /// Resolve as if `today` were the current day
    ///
    /// A success is reused for the rest of `today` without probing. Failures
    /// are not remembered.
    pub async fn resolve_on(&self, today: NaiveDate) -> Option<String> {
        {
            let memo = self.memo.read().await;
            if memo.resolved_on == Some(today) {
                if let Some(resolved) = &memo.resolved {
                    return Some(resolved.clone());
                }
            }
        }

        for candidate in candidates(today) {
            if self.probe.exists(&candidate).await {
                logger::log_info(&format!("Resolved latest build: {candidate}"));
                *self.memo.write().await = Resolution {
                    resolved: Some(candidate.clone()),
                    resolved_on: Some(today),
                };
                return Some(candidate);
            }
        }

        logger::log_warning(&format!(
            "No build found in the {LOOKBACK_DAYS} days up to {}",
            today.format("%Y-%m-%d")
        ));
        None
    }
}

/// Dated archive names for `today` and the preceding days, newest first
pub fn candidates(today: NaiveDate) -> Vec<String> {
    (0..LOOKBACK_DAYS)
        .filter_map(|days_ago| today.checked_sub_days(Days::new(days_ago)))
        .map(|day| format!("{}.pmtiles", day.format("%Y%m%d")))
        .collect()
}
