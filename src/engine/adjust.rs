//! Population calibration: a slow proportional controller that nudges every
//! maturing card toward the target percent-correct, compensating for
//! systematic miscalibration of the per-card formulas.

use crate::config::SchedulerConfig;
use crate::engine::stats;
use crate::store::{Store, StoreError};

/// Maximum downward rescale in one step.
const MAX_SHRINK: f64 = -0.5;

pub(crate) async fn adjust_cards(
    store: &dyn Store,
    config: &SchedulerConfig,
    now: i64,
) -> Result<(), StoreError> {
    let percent_correct = stats::percent_correct(
        store,
        config,
        now,
        config.percent_correct_window,
        config.mature_threshold,
        config.max_interval,
    )
    .await?;
    if percent_correct == 0.0 {
        // insufficient data
        return Ok(());
    }

    let error = percent_correct - config.percent_correct_target;
    if error.abs() <= 1.0 {
        return Ok(());
    }

    let adjustment = (error * config.percent_correct_sensitivity).max(MAX_SHRINK);
    let touched = store
        .adjust_cards(
            adjustment,
            now,
            config.learning_threshold,
            config.max_interval,
        )
        .await?;

    tracing::debug!(
        percent_correct,
        adjustment,
        cards = touched,
        "calibrated maturing cohort"
    );
    Ok(())
}
