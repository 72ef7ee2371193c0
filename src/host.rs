use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Workload summary for the trailing 24 hours, as tracked by the host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Past24Hours {
    /// Reviews completed.
    pub count: i64,
    /// Seconds of study.
    pub time: f64,
    /// New cards introduced.
    pub new_cards: i64,
}

/// The embedding application. Supplies workload statistics the scheduler
/// does not compute itself and a durable key/value parameter store used for
/// the new-card release countdown.
#[async_trait]
pub trait Host: Send + Sync {
    async fn stats_past_24_hours(&self) -> Result<Past24Hours, StoreError>;

    /// Projected seconds of study over the next 24 hours.
    async fn time_next_24_hours(&self) -> Result<f64, StoreError>;

    async fn count_cards_overdue(&self) -> Result<i64, StoreError>;

    async fn get_param(&self, name: &str) -> Result<Option<i64>, StoreError>;

    async fn set_param(&self, name: &str, value: i64) -> Result<(), StoreError>;
}
