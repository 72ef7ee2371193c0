//! Per-card interval formulas.
//!
//! `fail` and `hard` scale from the raw current interval for fast
//! convergence to a safe short interval. `good` and `easy` scale from the
//! card's smoothed recent pace so one unusually late or early review does
//! not whiplash the schedule.

use crate::config::SchedulerConfig;
use crate::engine::{Card, Ease, EaseIntervals};
use crate::store::{Store, StoreError};

pub fn ease_weight(config: &SchedulerConfig, ease: Ease) -> f64 {
    match ease {
        Ease::Fail => config.weight_fail,
        Ease::Hard => config.weight_hard,
        Ease::Good => config.weight_good,
        Ease::Easy => config.weight_easy,
    }
}

/// EWMA difficulty factor after a review with the given ease.
pub fn updated_factor(config: &SchedulerConfig, card: &Card, ease: Ease) -> f64 {
    config.decay_factor * card.factor + (1.0 - config.decay_factor) * ease_weight(config, ease)
}

fn in_learning(config: &SchedulerConfig, card: &Card) -> bool {
    card.interval() < config.learning_threshold
}

pub fn interval_fail(config: &SchedulerConfig, card: &Card) -> i64 {
    let cap = if in_learning(config, card) {
        config.fail_learning_max_interval
    } else {
        config.fail_max_interval
    };
    let scaled = card.interval() as f64 * config.fail_factor;
    ((cap as f64).min(scaled).floor() as i64).max(1)
}

pub fn interval_hard(config: &SchedulerConfig, card: &Card) -> i64 {
    let cap = if in_learning(config, card) {
        config.hard_learning_max_interval
    } else {
        config.hard_max_interval
    };
    let scaled = card.interval() as f64 * config.hard_factor;
    ((cap as f64).min(scaled).floor() as i64).max(1)
}

pub fn interval_good(config: &SchedulerConfig, card: &Card, recent_interval: i64) -> i64 {
    let growth = config
        .good_min_factor
        .max(config.good_factor * updated_factor(config, card, Ease::Good));
    let raw = (recent_interval as f64 * growth).max(config.good_min_interval as f64);
    let capped = raw
        .min(config.max_interval as f64)
        .min(config.max_good_interval as f64);
    (capped.floor() as i64).max(1)
}

pub fn interval_easy(config: &SchedulerConfig, card: &Card, recent_interval: i64) -> i64 {
    let growth = config.easy_factor * updated_factor(config, card, Ease::Easy);
    let raw = (recent_interval as f64 * growth).max(config.easy_min_interval as f64);
    let capped = raw
        .min(config.max_interval as f64)
        .min(config.max_easy_interval as f64);
    (capped.floor() as i64).max(1)
}

pub fn new_interval(
    config: &SchedulerConfig,
    card: &Card,
    ease: Ease,
    recent_interval: i64,
) -> i64 {
    match ease {
        Ease::Fail => interval_fail(config, card),
        Ease::Hard => interval_hard(config, card),
        Ease::Good => interval_good(config, card, recent_interval),
        Ease::Easy => interval_easy(config, card, recent_interval),
    }
}

pub fn ease_intervals(config: &SchedulerConfig, card: &Card, recent_interval: i64) -> EaseIntervals {
    EaseIntervals {
        fail: interval_fail(config, card),
        hard: interval_hard(config, card),
        good: interval_good(config, card, recent_interval),
        easy: interval_easy(config, card, recent_interval),
    }
}

/// The card's smoothed recent pace: time since its last review averaged with
/// the mean of its last few logged intervals. History stops at the most
/// recent graduation row (`last_interval == 0`) so a restarted card is not
/// pulled by pre-reset history. Falls back to the raw current interval when
/// the card has no log rows, and is 0 for a new card.
pub async fn recent_interval(
    store: &dyn Store,
    config: &SchedulerConfig,
    card: &Card,
    now: i64,
) -> Result<i64, StoreError> {
    if card.is_new() {
        return Ok(0);
    }

    let history = store
        .recent_reviews(card.id, config.recent_interval_window)
        .await?;
    if history.is_empty() {
        return Ok(card.interval());
    }

    let time_since_last = (now - history[0].id / 1000).max(0);
    let mut intervals = Vec::with_capacity(history.len());
    for entry in &history {
        intervals.push(entry.interval);
        if entry.last_interval == 0 {
            break;
        }
    }
    let mean = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

    Ok((((time_since_last as f64 + mean) / 2.0).floor() as i64).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Scheduling;

    fn seen_card(interval: i64, factor: f64) -> Card {
        Card {
            id: 1,
            fieldset_id: 1,
            template_id: 1,
            modified: 0,
            scheduling: Scheduling::Seen {
                interval,
                last_interval: interval,
                due: 0,
            },
            factor,
            views: 1,
            lapses: 0,
            ord: 0,
        }
    }

    fn new_card() -> Card {
        Card {
            scheduling: Scheduling::New,
            factor: 0.0,
            views: 0,
            ..seen_card(0, 0.0)
        }
    }

    const DAY: i64 = 86_400;

    #[test]
    fn factor_is_an_ewma_of_ease_weights() {
        let config = SchedulerConfig::default();
        let card = seen_card(600, 0.0);
        let factor = updated_factor(&config, &card, Ease::Good);
        assert!((factor - 0.075).abs() < 1e-12);

        let seasoned = seen_card(600, 2.0);
        let next = updated_factor(&config, &seasoned, Ease::Fail);
        assert!((next - 1.9).abs() < 1e-12);
    }

    #[test]
    fn new_card_gets_floor_intervals() {
        let config = SchedulerConfig::default();
        let card = new_card();
        let iv = ease_intervals(&config, &card, 0);
        assert_eq!(iv.fail, 1);
        assert_eq!(iv.hard, 1);
        assert_eq!(iv.good, config.good_min_interval);
        assert_eq!(iv.easy, config.easy_min_interval);
    }

    #[test]
    fn good_scales_recent_interval_by_min_growth() {
        let config = SchedulerConfig::default();
        let card = seen_card(600, 0.0);
        // factor after good is 0.075, so goodFactor * factor loses to
        // goodMinFactor and the interval grows by exactly 1.1
        assert_eq!(interval_good(&config, &card, 600), 660);
    }

    #[test]
    fn learning_cards_use_learning_caps() {
        let config = SchedulerConfig::default();
        let card = seen_card(6 * DAY, 1.2);
        assert_eq!(interval_fail(&config, &card), config.fail_learning_max_interval);
        assert_eq!(interval_hard(&config, &card), config.hard_learning_max_interval);
    }

    #[test]
    fn learned_cards_use_full_caps() {
        let config = SchedulerConfig::default();
        let card = seen_card(365 * DAY, 1.8);
        assert_eq!(interval_fail(&config, &card), config.fail_max_interval);
        assert_eq!(interval_hard(&config, &card), config.hard_max_interval);
        assert_eq!(interval_good(&config, &card, 365 * DAY), config.max_good_interval);
        assert_eq!(interval_easy(&config, &card, 365 * DAY), config.max_easy_interval);
    }

    #[test]
    fn short_fail_interval_keeps_minimum_of_one() {
        let config = SchedulerConfig::default();
        let card = seen_card(1, 0.5);
        assert_eq!(interval_fail(&config, &card), 1);
    }
}
