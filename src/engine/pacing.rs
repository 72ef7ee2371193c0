//! New-card release policy.
//!
//! New cards are paced against actual recent throughput rather than a fixed
//! ratio, so the pacing self-corrects when the learner's study habits
//! change.

use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::engine::stats;
use crate::host::Past24Hours;
use crate::store::{Store, StoreError};

/// How freely new cards may currently be released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewCardMode {
    /// Well under the daily study-time minimum: new cards flow freely.
    Go,
    /// Between the minimum and the target: a new card only after the review
    /// countdown reaches zero.
    Slow,
    /// At the study-time target, the daily new-card cap, or with overdue
    /// cards pending: no new cards.
    Stop,
}

/// Recomputed each time a card is requested; never cached.
pub(crate) fn new_card_mode(
    config: &SchedulerConfig,
    past: &Past24Hours,
    next_24h_time: f64,
    overdue: i64,
) -> NewCardMode {
    let target = config.target_study_time as f64;
    if past.time >= target
        || next_24h_time >= target
        || past.new_cards >= config.max_new_cards_per_day
        || overdue > 0
    {
        return NewCardMode::Stop;
    }
    if past.time < config.min_study_time as f64 {
        return NewCardMode::Go;
    }
    NewCardMode::Slow
}

/// Ceiling for the countdown of reviews between new cards:
/// scale the recent review rate by how far actual study time is over or
/// under target, spread across the recent new-card rate (or the daily cap
/// when no new cards have been seen yet).
pub(crate) async fn reviews_between_new_cards(
    store: &dyn Store,
    config: &SchedulerConfig,
) -> Result<i64, StoreError> {
    let days = stats::DEFAULT_WINDOW_DAYS;
    let avg_study_time = stats::average_study_time(store, days).await?;
    let avg_reviews = stats::average_reviews_per_day(store, days).await?;
    let avg_new_cards = stats::average_new_cards_per_day(store, days).await?;

    let new_cards_per_day = if avg_new_cards > 0.0 {
        avg_new_cards
    } else {
        config.max_new_cards_per_day as f64
    };

    let value = config.new_card_rate_factor
        * (avg_study_time / config.target_study_time as f64)
        * avg_reviews
        / new_cards_per_day.max(1.0);

    Ok(value.floor() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn past(time: f64, new_cards: i64) -> Past24Hours {
        Past24Hours {
            count: 0,
            time,
            new_cards,
        }
    }

    #[test]
    fn overdue_cards_stop_new_releases() {
        let config = SchedulerConfig::default();
        assert_eq!(
            new_card_mode(&config, &past(0.0, 0), 0.0, 1),
            NewCardMode::Stop
        );
    }

    #[test]
    fn study_time_at_target_stops_new_releases() {
        let config = SchedulerConfig::default();
        let at_target = config.target_study_time as f64;
        assert_eq!(
            new_card_mode(&config, &past(at_target, 0), 0.0, 0),
            NewCardMode::Stop
        );
        assert_eq!(
            new_card_mode(&config, &past(0.0, 0), at_target, 0),
            NewCardMode::Stop
        );
    }

    #[test]
    fn daily_cap_stops_new_releases() {
        let config = SchedulerConfig::default();
        assert_eq!(
            new_card_mode(&config, &past(0.0, config.max_new_cards_per_day), 0.0, 0),
            NewCardMode::Stop
        );
    }

    #[test]
    fn light_days_release_freely() {
        let config = SchedulerConfig::default();
        assert_eq!(
            new_card_mode(&config, &past(100.0, 3), 500.0, 0),
            NewCardMode::Go
        );
    }

    #[test]
    fn middling_load_slows_releases() {
        let config = SchedulerConfig::default();
        let time = config.min_study_time as f64 + 100.0;
        assert_eq!(
            new_card_mode(&config, &past(time, 3), 500.0, 0),
            NewCardMode::Slow
        );
    }
}
