//! # kartei: adaptive spaced-repetition scheduling
//!
//! Decides when a flashcard should next be reviewed and which card to show
//! next, for a single learner's collection:
//!
//! - **Interval engine**: per-card interval update on review, driven by an
//!   EWMA difficulty factor and the card's recent review pace.
//! - **Release policy**: a `go`/`slow`/`stop` state machine paces the
//!   introduction of new cards against actual review throughput.
//! - **Selector**: due-card retrieval with randomized near-tie selection,
//!   new-card retrieval that avoids back-to-back related cards.
//! - **Calibration loop**: nudges the whole maturing cohort toward a target
//!   percent-correct after each mature review.
//!
//! Storage and host integration are pluggable: the engine talks to a narrow
//! async [`Store`] trait (a SQLite adapter ships in [`store::sqlite`]) and a
//! [`Host`] trait supplying workload statistics and a persistent parameter
//! store.

pub mod config;
pub mod engine;
pub mod host;
pub mod logging;
pub mod store;

pub use config::SchedulerConfig;
pub use engine::{
    Card, Ease, EaseIntervals, NewCardMode, ReviewLogEntry, Scheduler, SchedulerError, Scheduling,
    StatsNext24Hours,
};
pub use host::{Host, Past24Hours};
pub use store::{sqlite::SqliteStore, DayMetric, DueOrder, Store, StoreError};
