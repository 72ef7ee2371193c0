use std::sync::Arc;

use chrono::{Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::engine::pacing::NewCardMode;
use crate::engine::{adjust, intervals, pacing, selector, stats};
use crate::engine::{Card, Ease, EaseIntervals, ReviewLogEntry, SchedulerError, Scheduling};
use crate::host::Host;
use crate::store::Store;

const DAY: i64 = 86_400;

/// Host param key for the persisted new-card release countdown.
const REVIEWS_TO_NEXT_NEW_PARAM: &str = "reviewsToNextNew";

/// View/study time recorded when a review is treated as an idle timeout.
const IDLE_REVIEW_TIME: i64 = 120;

/// Projected workload for the next 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsNext24Hours {
    /// Reviews coming due.
    pub count: i64,
    /// Estimated seconds of study.
    pub time: f64,
    /// Current ceiling for the reviews-between-new-cards countdown.
    pub min_reviews: i64,
    /// Reviews left before the next new card may be shown.
    pub reviews_to_next_new: i64,
}

/// The scheduling engine for one learner's collection.
///
/// Owns the resolved configuration and the release countdown; everything
/// else lives behind the [`Store`] and [`Host`] collaborators. Embed one
/// `Scheduler` per learner and call it from one task at a time; operations
/// that touch state take `&mut self`.
pub struct Scheduler {
    config: SchedulerConfig,
    store: Arc<dyn Store>,
    host: Arc<dyn Host>,
    reviews_to_next_new: i64,
}

impl Scheduler {
    pub async fn new(
        config: SchedulerConfig,
        store: Arc<dyn Store>,
        host: Arc<dyn Host>,
    ) -> Result<Self, SchedulerError> {
        let reviews_to_next_new = host
            .get_param(REVIEWS_TO_NEXT_NEW_PARAM)
            .await?
            .unwrap_or(0)
            .max(0);
        Ok(Self {
            config,
            store,
            host,
            reviews_to_next_new,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn reviews_to_next_new(&self) -> i64 {
        self.reviews_to_next_new
    }

    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    /// Apply one review: update the card's scheduling state, append the log
    /// entry, defer related cards, advance the release countdown, and (for
    /// cards past the learning threshold) run calibration.
    pub async fn review(
        &mut self,
        card: &Card,
        view_time: i64,
        study_time: i64,
        ease: Ease,
    ) -> Result<(), SchedulerError> {
        let now = self.now();

        // A very long view means the learner walked away mid-card.
        let (view_time, study_time, ease) = if view_time > self.config.max_view_time {
            (IDLE_REVIEW_TIME, IDLE_REVIEW_TIME, Ease::Fail)
        } else {
            (view_time.max(0), study_time.max(0), ease)
        };

        let pre_interval = card.interval();
        let recent =
            intervals::recent_interval(self.store.as_ref(), &self.config, card, now).await?;
        let new_interval = intervals::new_interval(&self.config, card, ease, recent).max(1);
        let factor = intervals::updated_factor(&self.config, card, ease);

        let lapsed = new_interval < self.config.mature_threshold
            && pre_interval >= self.config.mature_threshold;
        let lapses = card.lapses + i64::from(lapsed);

        let updated = Card {
            modified: now,
            scheduling: Scheduling::Seen {
                interval: new_interval,
                last_interval: pre_interval,
                due: now + new_interval,
            },
            factor,
            views: card.views + 1,
            lapses,
            ..card.clone()
        };
        self.store.update_card_review(&updated).await?;

        let now_ms = Utc::now().timestamp_millis();
        let id = match self.store.max_review_id().await? {
            Some(max) => now_ms.max(max + 1),
            None => now_ms,
        };
        let entry = ReviewLogEntry {
            id,
            rev_date: Local::now().format("%Y-%m-%d").to_string(),
            card_id: card.id,
            ease,
            interval: new_interval,
            last_interval: pre_interval,
            factor,
            view_time,
            study_time,
            lapses,
        };
        self.store.append_review(&entry).await?;

        self.store
            .defer_related(
                card.fieldset_id,
                card.id,
                now + self.config.min_time_between_related_cards,
            )
            .await?;

        self.advance_release_countdown(pre_interval == 0).await?;

        if pre_interval > self.config.learning_threshold {
            adjust::adjust_cards(self.store.as_ref(), &self.config, now).await?;
        }

        tracing::debug!(
            card_id = card.id,
            ease = %ease,
            pre_interval,
            new_interval,
            lapsed,
            "review applied"
        );
        Ok(())
    }

    /// Countdown bookkeeping: reset to a fresh ceiling when a new card was
    /// just graduated, otherwise clamp to the fresh ceiling (it never rises
    /// mid-countdown) and tick down. Flushed to the host on every change.
    async fn advance_release_countdown(&mut self, new_card: bool) -> Result<(), SchedulerError> {
        let ceiling = pacing::reviews_between_new_cards(self.store.as_ref(), &self.config).await?;
        self.reviews_to_next_new = if new_card {
            ceiling
        } else {
            (self.reviews_to_next_new.min(ceiling) - 1).max(0)
        };
        self.host
            .set_param(REVIEWS_TO_NEXT_NEW_PARAM, self.reviews_to_next_new)
            .await?;
        Ok(())
    }

    /// The four intervals the card would get, one per ease. A pure read:
    /// neither the card nor the log is touched.
    pub async fn get_intervals(&self, card: &Card) -> Result<EaseIntervals, SchedulerError> {
        let now = self.now();
        let recent =
            intervals::recent_interval(self.store.as_ref(), &self.config, card, now).await?;
        Ok(intervals::ease_intervals(&self.config, card, recent))
    }

    /// As [`get_intervals`](Self::get_intervals), looking the card up first.
    pub async fn get_intervals_for_card(
        &self,
        card_id: i64,
    ) -> Result<EaseIntervals, SchedulerError> {
        let card = self
            .store
            .card_by_id(card_id)
            .await?
            .ok_or(SchedulerError::CardNotFound(card_id))?;
        self.get_intervals(&card).await
    }

    /// The current release mode, from live workload statistics.
    pub async fn new_card_mode(&self) -> Result<NewCardMode, SchedulerError> {
        let past = self.host.stats_past_24_hours().await?;
        let next_time = self.host.time_next_24_hours().await?;
        let overdue = self.host.count_cards_overdue().await?;
        Ok(pacing::new_card_mode(&self.config, &past, next_time, overdue))
    }

    /// The next card to present, or `None` when there is nothing to study.
    ///
    /// With `override_limits` all pacing is ignored: the most-due seen card
    /// wins, else the earliest unseen card.
    pub async fn get_next_card(&self, override_limits: bool) -> Result<Option<Card>, SchedulerError> {
        let now = self.now();

        if override_limits {
            if let Some(card) = selector::most_due(self.store.as_ref()).await? {
                return Ok(Some(card));
            }
            return Ok(self.store.earliest_new_card().await?);
        }

        let mode = self.new_card_mode().await?;
        let due = selector::next_due(self.store.as_ref(), &self.config, false, now).await?;

        let want_new = match mode {
            NewCardMode::Stop => false,
            NewCardMode::Go => due.is_none() || self.reviews_to_next_new == 0,
            NewCardMode::Slow => self.reviews_to_next_new == 0,
        };
        if want_new {
            if let Some(card) = selector::next_new(self.store.as_ref(), &self.config, now).await? {
                return Ok(Some(card));
            }
        }

        Ok(due)
    }

    /// A due card, picked among near-ties. `None` when nothing is due.
    pub async fn get_next_due(&self, override_limits: bool) -> Result<Option<Card>, SchedulerError> {
        let now = self.now();
        Ok(selector::next_due(self.store.as_ref(), &self.config, override_limits, now).await?)
    }

    /// The next eligible unseen card. `None` when none qualifies.
    pub async fn get_next_new(&self) -> Result<Option<Card>, SchedulerError> {
        let now = self.now();
        Ok(selector::next_new(self.store.as_ref(), &self.config, now).await?)
    }

    /// When the most urgent seen card comes due. `None` with no seen cards.
    pub async fn get_time_next_due(&self) -> Result<Option<i64>, SchedulerError> {
        let card = selector::most_due(self.store.as_ref()).await?;
        Ok(card.map(|c| c.due()))
    }

    /// Projected review count and study time for the next 24 hours.
    pub async fn get_stats_next_24_hours(&self) -> Result<StatsNext24Hours, SchedulerError> {
        let now = self.now();
        let store = self.store.as_ref();

        let count = selector::cards_to_review(store, &self.config, DAY, now, None).await?;
        // short-interval cards study like new cards: several repetitions,
        // more time each
        let new_count =
            selector::cards_to_review(store, &self.config, DAY, now, Some(DAY)).await?;
        let old_count = count - new_count;

        let per_new = stats::study_time_per_card(store, true, now).await?;
        let per_old = stats::study_time_per_card(store, false, now).await?;
        let time = old_count as f64 * per_old + new_count as f64 * per_new;

        let min_reviews = pacing::reviews_between_new_cards(store, &self.config).await?;

        Ok(StatsNext24Hours {
            count,
            time,
            min_reviews,
            reviews_to_next_new: self.reviews_to_next_new,
        })
    }

    /// Reviews coming due before local midnight.
    pub async fn get_count_cards_due_today(&self) -> Result<i64, SchedulerError> {
        let now = self.now();
        let remaining_today = DAY - i64::from(Local::now().num_seconds_from_midnight());
        Ok(
            selector::cards_to_review(self.store.as_ref(), &self.config, remaining_today, now, None)
                .await?,
        )
    }

    /// Percent-correct over the configured window for mature cards; `0.0`
    /// means "insufficient data", not a real score.
    pub async fn percent_correct(&self) -> Result<f64, SchedulerError> {
        let now = self.now();
        Ok(stats::percent_correct(
            self.store.as_ref(),
            &self.config,
            now,
            self.config.percent_correct_window,
            self.config.mature_threshold,
            self.config.max_interval,
        )
        .await?)
    }

    /// Flush persisted scheduler state to the host.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.host
            .set_param(REVIEWS_TO_NEXT_NEW_PARAM, self.reviews_to_next_new)
            .await?;
        tracing::info!(
            reviews_to_next_new = self.reviews_to_next_new,
            "scheduler state flushed"
        );
        Ok(())
    }
}
