pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::engine::{Card, ReviewLogEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Escape hatch for store or host implementations not built on sqlx.
    #[error("{0}")]
    Other(String),
}

/// Ordering for due-card retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueOrder {
    /// `(due, templateid)`: strictly oldest first.
    Due,
    /// `(interval, due, templateid)`: shortest intervals first.
    IntervalThenDue,
}

/// Per-day review-log aggregate selected by [`Store::average_per_day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayMetric {
    /// Sum of `study_time` per day.
    StudyTime,
    /// Review rows per day.
    Reviews,
    /// Rows with `last_interval == 0` per day (first graduations).
    NewCards,
}

/// Storage the scheduler runs against. Implementations must apply each write
/// atomically; the engine performs no retries and no compensation.
#[async_trait]
pub trait Store: Send + Sync {
    // card reads

    async fn card_by_id(&self, id: i64) -> Result<Option<Card>, StoreError>;

    /// Seen cards (`interval != 0`), optionally restricted to `due <
    /// due_before`, in the given order.
    async fn due_cards(
        &self,
        due_before: Option<i64>,
        order: DueOrder,
        limit: i64,
    ) -> Result<Vec<Card>, StoreError>;

    /// Earliest unseen card by authoring order.
    async fn earliest_new_card(&self) -> Result<Option<Card>, StoreError>;

    /// Earliest unseen card whose fieldset neither has a seen card due
    /// before `related_due_before` nor was reviewed after
    /// `reviewed_after_ms`.
    async fn next_new_card(
        &self,
        related_due_before: i64,
        reviewed_after_ms: i64,
    ) -> Result<Option<Card>, StoreError>;

    /// Distinct fieldsets with a seen card due before `due_before`.
    /// `interval_below` restricts to short-interval cards.
    async fn count_due_fieldsets(
        &self,
        due_before: i64,
        interval_below: Option<i64>,
    ) -> Result<i64, StoreError>;

    /// Seen cards with `due` in `(due_after, due_before)`.
    async fn count_due_between(
        &self,
        due_after: i64,
        due_before: i64,
        interval_below: Option<i64>,
    ) -> Result<i64, StoreError>;

    // card writes

    /// Full-row scheduling update after a review.
    async fn update_card_review(&self, card: &Card) -> Result<(), StoreError>;

    /// Push every other seen card of the fieldset with `due < due` out to
    /// `due`.
    async fn defer_related(
        &self,
        fieldset_id: i64,
        except_card_id: i64,
        due: i64,
    ) -> Result<(), StoreError>;

    /// Calibration write: `interval += interval * adjustment` (floored) and
    /// `due += interval * adjustment` (floored) for cards with `due > now`
    /// and `interval` strictly inside `(min_interval, max_interval)`.
    /// Returns the number of cards touched.
    async fn adjust_cards(
        &self,
        adjustment: f64,
        now: i64,
        min_interval: i64,
        max_interval: i64,
    ) -> Result<u64, StoreError>;

    // review-log reads

    async fn last_review(&self, card_id: i64) -> Result<Option<ReviewLogEntry>, StoreError>;

    /// Most recent `limit` log entries for the card, newest first.
    async fn recent_reviews(
        &self,
        card_id: i64,
        limit: i64,
    ) -> Result<Vec<ReviewLogEntry>, StoreError>;

    async fn max_review_id(&self) -> Result<Option<i64>, StoreError>;

    /// Mean of the per-day aggregate over the `days` most recent calendar
    /// dates that have log rows, excluding the newest such date (it is
    /// incomplete). `0.0` with no qualifying rows.
    async fn average_per_day(&self, metric: DayMetric, days: i64) -> Result<f64, StoreError>;

    /// Mean over days of `sum(study_time) / count(distinct card)` for
    /// graduation rows (`new_cards = true`, `last_interval == 0`) or
    /// ordinary rows, optionally restricted to `id > since_ms`. `None` with
    /// no qualifying rows.
    async fn study_time_per_card(
        &self,
        new_cards: bool,
        since_ms: Option<i64>,
    ) -> Result<Option<f64>, StoreError>;

    /// Sample for the percent-correct estimate: count and fraction of
    /// non-`fail` rows with `last_interval` in `(min_interval,
    /// max_interval)` and id in `(from_ms, to_ms]`.
    async fn percent_correct_sample(
        &self,
        min_interval: i64,
        max_interval: i64,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<(i64, f64), StoreError>;

    // review-log write

    async fn append_review(&self, entry: &ReviewLogEntry) -> Result<(), StoreError>;
}
