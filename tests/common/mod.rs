#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Local, Utc};

use kartei::{Card, Ease, Host, Past24Hours, ReviewLogEntry, Scheduling, SqliteStore, Store, StoreError};

/// Host double with settable workload stats and an in-memory param store.
#[derive(Default)]
pub struct FixtureHost {
    pub past: Mutex<Past24Hours>,
    pub next_time: Mutex<f64>,
    pub overdue: Mutex<i64>,
    pub params: Mutex<HashMap<String, i64>>,
}

impl FixtureHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_past(&self, past: Past24Hours) {
        *self.past.lock().unwrap() = past;
    }

    pub fn set_overdue(&self, overdue: i64) {
        *self.overdue.lock().unwrap() = overdue;
    }

    pub fn set_param_value(&self, name: &str, value: i64) {
        self.params.lock().unwrap().insert(name.to_string(), value);
    }

    pub fn param_value(&self, name: &str) -> Option<i64> {
        self.params.lock().unwrap().get(name).copied()
    }
}

#[async_trait]
impl Host for FixtureHost {
    async fn stats_past_24_hours(&self) -> Result<Past24Hours, StoreError> {
        Ok(*self.past.lock().unwrap())
    }

    async fn time_next_24_hours(&self) -> Result<f64, StoreError> {
        Ok(*self.next_time.lock().unwrap())
    }

    async fn count_cards_overdue(&self) -> Result<i64, StoreError> {
        Ok(*self.overdue.lock().unwrap())
    }

    async fn get_param(&self, name: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.params.lock().unwrap().get(name).copied())
    }

    async fn set_param(&self, name: &str, value: i64) -> Result<(), StoreError> {
        self.params.lock().unwrap().insert(name.to_string(), value);
        Ok(())
    }
}

pub fn now_s() -> i64 {
    Utc::now().timestamp()
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn local_date_days_ago(days: i64) -> String {
    (Local::now() - Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

pub async fn add_new_card(
    store: &SqliteStore,
    fieldset_id: i64,
    template_id: i64,
    ord: i64,
) -> Card {
    store
        .insert_card(fieldset_id, template_id, ord)
        .await
        .expect("insert card")
}

pub async fn add_seen_card(
    store: &SqliteStore,
    fieldset_id: i64,
    template_id: i64,
    ord: i64,
    interval: i64,
    due: i64,
) -> Card {
    let mut card = add_new_card(store, fieldset_id, template_id, ord).await;
    card.scheduling = Scheduling::Seen {
        interval,
        last_interval: interval,
        due,
    };
    card.views = 1;
    card.modified = now_s();
    store.update_card_review(&card).await.expect("update card");
    card
}

pub fn log_row(
    id_ms: i64,
    rev_date: &str,
    card_id: i64,
    ease: Ease,
    interval: i64,
    last_interval: i64,
    study_time: i64,
) -> ReviewLogEntry {
    ReviewLogEntry {
        id: id_ms,
        rev_date: rev_date.to_string(),
        card_id,
        ease,
        interval,
        last_interval,
        factor: 1.0,
        view_time: study_time,
        study_time,
        lapses: 0,
    }
}

pub async fn seed_log(store: &SqliteStore, rows: &[ReviewLogEntry]) {
    for row in rows {
        store.append_review(row).await.expect("append review");
    }
}
