use serde::{Deserialize, Serialize};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * 60;
const DAY: i64 = 60 * 60 * 24;
const YEAR: i64 = DAY * 365;

/// Resolved scheduler parameters.
///
/// Durations are seconds; the host resolves any human-readable values
/// ("1 week") before constructing this. Every field has a documented default
/// and missing fields fall back to it during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    /// EWMA memory length for the per-card difficulty factor.
    pub decay_factor: f64,
    /// Multiplier applied to the recent interval on an `easy` review.
    pub easy_factor: f64,
    /// Floor for the interval produced by an `easy` review.
    pub easy_min_interval: i64,
    /// Multiplier applied to the current interval on a `fail` review.
    pub fail_factor: f64,
    /// Cap for `fail` intervals once the card has left the learning band.
    pub fail_max_interval: i64,
    /// Cap for `fail` intervals while the card is still in learning.
    pub fail_learning_max_interval: i64,
    /// Multiplier applied to the recent interval on a `good` review.
    pub good_factor: f64,
    /// Minimum growth multiplier for `good`, regardless of the factor.
    pub good_min_factor: f64,
    /// Floor for the interval produced by a `good` review.
    pub good_min_interval: i64,
    /// Multiplier applied to the current interval on a `hard` review.
    pub hard_factor: f64,
    /// Cap for `hard` intervals once the card has left the learning band.
    pub hard_max_interval: i64,
    /// Cap for `hard` intervals while the card is still in learning.
    pub hard_learning_max_interval: i64,
    /// Interval below which a card counts as "in learning".
    pub learning_threshold: i64,
    /// Interval at or above which a card counts as mature; dropping back
    /// below it is a lapse.
    pub mature_threshold: i64,
    /// Cap for `easy` intervals.
    pub max_easy_interval: i64,
    /// Cap for `good` intervals.
    pub max_good_interval: i64,
    /// Absolute interval ceiling.
    pub max_interval: i64,
    /// Daily cap on newly introduced cards.
    pub max_new_cards_per_day: i64,
    /// View times above this are treated as an idle timeout and forced to a
    /// failed review.
    pub max_view_time: i64,
    /// Minimum qualifying sample size before percent-correct is meaningful.
    pub min_percent_correct_count: i64,
    /// Below this much study in the past day, new cards flow unconditionally.
    pub min_study_time: i64,
    /// Minimum separation between cards of the same fieldset.
    pub min_time_between_related_cards: i64,
    /// Scales the review countdown between new-card releases.
    pub new_card_rate_factor: f64,
    /// Proportional gain of the calibration loop.
    pub percent_correct_sensitivity: f64,
    /// Long-run accuracy target for mature cards, in percent.
    pub percent_correct_target: f64,
    /// Trailing window for the percent-correct estimate.
    pub percent_correct_window: i64,
    /// Probability of presenting due cards strictly oldest-first.
    pub probability_oldest_due: f64,
    /// How many past reviews feed the recent-interval estimate.
    pub recent_interval_window: i64,
    /// Gain on the study-time error when deriving a review threshold
    /// directly. Carried for config compatibility; the persisted-countdown
    /// release policy does not consume it.
    pub study_time_error_sensitivity: f64,
    /// Daily study-time budget the release policy steers toward.
    pub target_study_time: i64,
    pub weight_easy: f64,
    pub weight_fail: f64,
    pub weight_good: f64,
    pub weight_hard: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            decay_factor: 0.95,
            easy_factor: 1.8,
            easy_min_interval: DAY,
            fail_factor: 0.5,
            fail_max_interval: HOUR,
            fail_learning_max_interval: 5 * MINUTE,
            good_factor: 1.1,
            good_min_factor: 1.1,
            good_min_interval: 5 * MINUTE,
            hard_factor: 0.8,
            hard_max_interval: DAY,
            hard_learning_max_interval: HOUR,
            learning_threshold: 7 * DAY,
            mature_threshold: 21 * DAY,
            max_easy_interval: YEAR,
            max_good_interval: YEAR,
            max_interval: YEAR,
            max_new_cards_per_day: 20,
            max_view_time: 2 * MINUTE,
            min_percent_correct_count: 10,
            min_study_time: 20 * MINUTE,
            min_time_between_related_cards: 30 * MINUTE,
            new_card_rate_factor: 0.8,
            percent_correct_sensitivity: 0.01,
            percent_correct_target: 90.0,
            percent_correct_window: 30 * DAY,
            probability_oldest_due: 0.5,
            recent_interval_window: 5,
            study_time_error_sensitivity: 2.0,
            target_study_time: HOUR,
            weight_easy: 2.0,
            weight_fail: 0.0,
            weight_good: 1.5,
            weight_hard: 1.0,
        }
    }
}

impl SchedulerConfig {
    /// Defaults with environment overrides for the knobs a deployment most
    /// often tunes without shipping a config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse::<i64>("KARTEI_TARGET_STUDY_TIME") {
            config.target_study_time = val;
        }
        if let Some(val) = env_parse::<i64>("KARTEI_MAX_NEW_CARDS_PER_DAY") {
            config.max_new_cards_per_day = val;
        }
        if let Some(val) = env_parse::<f64>("KARTEI_PERCENT_CORRECT_TARGET") {
            config.percent_correct_target = val;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}
