use kartei::engine::intervals::ease_intervals;
use kartei::{Card, SchedulerConfig, Scheduling};
use proptest::prelude::*;

const DAY: i64 = 86_400;

fn card_with(interval: i64, factor: f64) -> Card {
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

proptest! {
    #[test]
    fn intervals_respect_floors_and_caps(
        interval in 1i64..=400 * DAY,
        factor in 0.0f64..3.0,
        recent in 0i64..=400 * DAY,
    ) {
        let config = SchedulerConfig::default();
        let card = card_with(interval, factor);
        let iv = ease_intervals(&config, &card, recent);

        prop_assert!(iv.fail >= 1);
        prop_assert!(iv.hard >= 1);
        prop_assert!(iv.good >= 1);
        prop_assert!(iv.easy >= 1);

        let learning = interval < config.learning_threshold;
        let fail_cap = if learning {
            config.fail_learning_max_interval
        } else {
            config.fail_max_interval
        };
        prop_assert!(iv.fail <= fail_cap);

        let hard_cap = if learning {
            config.hard_learning_max_interval
        } else {
            config.hard_max_interval
        };
        prop_assert!(iv.hard <= hard_cap);

        prop_assert!(iv.good <= config.max_interval.min(config.max_good_interval));
        prop_assert!(iv.easy <= config.max_interval.min(config.max_easy_interval));
    }

    #[test]
    fn good_never_undershoots_its_floor(
        interval in 1i64..=400 * DAY,
        factor in 0.0f64..3.0,
        recent in 0i64..=400 * DAY,
    ) {
        let config = SchedulerConfig::default();
        let card = card_with(interval, factor);
        let iv = ease_intervals(&config, &card, recent);

        prop_assert!(iv.good >= config.good_min_interval);
        prop_assert!(iv.easy >= config.easy_min_interval);
    }
}
