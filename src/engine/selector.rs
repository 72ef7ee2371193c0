//! Due/new card retrieval.
//!
//! Due selection picks uniformly among up to five near-tie candidates so the
//! review sequence is not identical across sessions, while still biasing
//! toward genuinely urgent cards.

use rand::Rng;

use crate::config::SchedulerConfig;
use crate::engine::Card;
use crate::store::{DueOrder, Store, StoreError};

const DUE_CANDIDATES: i64 = 5;

/// Next due card. Without `override_limits` only cards already due qualify;
/// with it, any seen card does. The ordering alternates probabilistically
/// between strict due order and interval-then-due order (favoring shorter
/// intervals).
pub(crate) async fn next_due(
    store: &dyn Store,
    config: &SchedulerConfig,
    override_limits: bool,
    now: i64,
) -> Result<Option<Card>, StoreError> {
    let (due_before, order) = if override_limits {
        (None, DueOrder::Due)
    } else {
        let oldest_first = rand::rng().random::<f64>() < config.probability_oldest_due;
        let order = if oldest_first {
            DueOrder::Due
        } else {
            DueOrder::IntervalThenDue
        };
        (Some(now), order)
    };

    let cards = store.due_cards(due_before, order, DUE_CANDIDATES).await?;
    if cards.is_empty() {
        return Ok(None);
    }
    let pick = rand::rng().random_range(0..cards.len());
    Ok(cards.into_iter().nth(pick))
}

/// The single most-due seen card, if any card has ever been reviewed.
pub(crate) async fn most_due(store: &dyn Store) -> Result<Option<Card>, StoreError> {
    let cards = store.due_cards(None, DueOrder::Due, 1).await?;
    Ok(cards.into_iter().next())
}

/// Earliest unseen card by authoring order, skipping fieldsets that are due
/// soon or were reviewed recently.
pub(crate) async fn next_new(
    store: &dyn Store,
    config: &SchedulerConfig,
    now: i64,
) -> Result<Option<Card>, StoreError> {
    store
        .next_new_card(
            now + config.min_time_between_related_cards,
            (now - config.min_time_between_related_cards) * 1000,
        )
        .await
}

/// Reviews coming due within `secs`. Cards inside the relatedness window
/// collapse to one review per fieldset, since siblings will be deferred
/// rather than shown back-to-back.
pub(crate) async fn cards_to_review(
    store: &dyn Store,
    config: &SchedulerConfig,
    secs: i64,
    now: i64,
    interval_below: Option<i64>,
) -> Result<i64, StoreError> {
    let window = secs.min(config.min_time_between_related_cards);
    let mut count = store
        .count_due_fieldsets(now + window, interval_below)
        .await?;
    if secs > window {
        count += store
            .count_due_between(now + window, now + secs, interval_below)
            .await?;
    }
    Ok(count)
}
