//! Read-side estimators over the review log.
//!
//! Day-bucketed aggregates exclude the current (incomplete) day so that
//! short-interval cards reviewed several times per day do not drag the
//! per-day numbers down. "Not enough history yet" is an expected state for a
//! fresh collection, so estimators return sentinel values instead of
//! failing.

use crate::config::SchedulerConfig;
use crate::store::{DayMetric, Store, StoreError};

/// Trailing window, in days, for the workload estimators.
pub const DEFAULT_WINDOW_DAYS: i64 = 14;

/// Study-time price of one review when there is no history to price it from.
pub const DEFAULT_SECONDS_PER_CARD: f64 = 30.0;

const DAY: i64 = 86_400;

/// Mean seconds studied per day. 0 with no history.
pub async fn average_study_time(store: &dyn Store, days: i64) -> Result<f64, StoreError> {
    store.average_per_day(DayMetric::StudyTime, days).await
}

/// Mean reviews per day. 0 with no history.
pub async fn average_reviews_per_day(store: &dyn Store, days: i64) -> Result<f64, StoreError> {
    store.average_per_day(DayMetric::Reviews, days).await
}

/// Mean cards graduated out of "new" per day. 0 with no history.
pub async fn average_new_cards_per_day(store: &dyn Store, days: i64) -> Result<f64, StoreError> {
    store.average_per_day(DayMetric::NewCards, days).await
}

/// Percentage (0–100) of non-`fail` reviews in the window ending at `on`,
/// restricted to reviews whose prior interval lay in
/// `(min_interval, max_interval)`.
///
/// Returns exactly `0.0` when fewer than `min_percent_correct_count` rows
/// qualify; callers must treat that as "insufficient data", never as a real
/// 0% score.
pub async fn percent_correct(
    store: &dyn Store,
    config: &SchedulerConfig,
    on: i64,
    window: i64,
    min_interval: i64,
    max_interval: i64,
) -> Result<f64, StoreError> {
    let (count, fraction) = store
        .percent_correct_sample(min_interval, max_interval, (on - window) * 1000, on * 1000)
        .await?;
    if count < config.min_percent_correct_count {
        return Ok(0.0);
    }
    Ok(fraction * 100.0)
}

/// Seconds of study one review costs, estimated separately for first
/// graduations (`new_cards`) and ordinary reviews. Falls back from the
/// trailing window to all-time history, then to
/// [`DEFAULT_SECONDS_PER_CARD`].
pub async fn study_time_per_card(
    store: &dyn Store,
    new_cards: bool,
    now: i64,
) -> Result<f64, StoreError> {
    let since_ms = (now - DEFAULT_WINDOW_DAYS * DAY) * 1000;
    if let Some(avg) = store.study_time_per_card(new_cards, Some(since_ms)).await? {
        return Ok(avg);
    }
    if let Some(avg) = store.study_time_per_card(new_cards, None).await? {
        return Ok(avg);
    }
    Ok(DEFAULT_SECONDS_PER_CARD)
}
