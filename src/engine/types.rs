use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("card not found: {0}")]
    CardNotFound(i64),

    #[error("unsupported ease: {0}")]
    UnsupportedEase(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The learner's self-reported recall quality for one review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ease {
    Fail,
    Hard,
    Good,
    Easy,
}

impl Ease {
    pub const ALL: [Ease; 4] = [Ease::Fail, Ease::Hard, Ease::Good, Ease::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ease::Fail => "fail",
            Ease::Hard => "hard",
            Ease::Good => "good",
            Ease::Easy => "easy",
        }
    }

    pub fn is_correct(&self) -> bool {
        !matches!(self, Ease::Fail)
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ease {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(Ease::Fail),
            "hard" => Ok(Ease::Hard),
            "good" => Ok(Ease::Good),
            "easy" => Ok(Ease::Easy),
            other => Err(SchedulerError::UnsupportedEase(other.to_string())),
        }
    }
}

/// A card's scheduling state. `New` means the card has never been reviewed;
/// interval, last interval and due time only exist once it has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Scheduling {
    New,
    Seen {
        /// Seconds until the card is due again.
        interval: i64,
        /// The interval that was active going into the most recent review.
        last_interval: i64,
        /// Absolute due timestamp, seconds since the epoch.
        due: i64,
    },
}

/// One flashcard's scheduling record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: i64,
    /// Cards generated from the same source material share a fieldset.
    pub fieldset_id: i64,
    pub template_id: i64,
    pub modified: i64,
    pub scheduling: Scheduling,
    /// EWMA difficulty estimate, 0 until first reviewed.
    pub factor: f64,
    pub views: i64,
    pub lapses: i64,
    /// Authoring order, drives new-card presentation.
    pub ord: i64,
}

impl Card {
    pub fn is_new(&self) -> bool {
        matches!(self.scheduling, Scheduling::New)
    }

    pub fn interval(&self) -> i64 {
        match self.scheduling {
            Scheduling::New => 0,
            Scheduling::Seen { interval, .. } => interval,
        }
    }

    pub fn last_interval(&self) -> i64 {
        match self.scheduling {
            Scheduling::New => 0,
            Scheduling::Seen { last_interval, .. } => last_interval,
        }
    }

    pub fn due(&self) -> i64 {
        match self.scheduling {
            Scheduling::New => 0,
            Scheduling::Seen { due, .. } => due,
        }
    }
}

/// Append-only record of one review event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    /// Milliseconds since the epoch, strictly increasing across the log.
    pub id: i64,
    /// Local calendar date of the review, for day-bucketed aggregation.
    pub rev_date: String,
    pub card_id: i64,
    pub ease: Ease,
    /// The newly computed interval.
    pub interval: i64,
    /// The interval going into this review; 0 marks a first graduation.
    pub last_interval: i64,
    pub factor: f64,
    pub view_time: i64,
    pub study_time: i64,
    pub lapses: i64,
}

/// The four candidate intervals for a card, one per ease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EaseIntervals {
    pub fail: i64,
    pub hard: i64,
    pub good: i64,
    pub easy: i64,
}

impl EaseIntervals {
    pub fn get(&self, ease: Ease) -> i64 {
        match ease {
            Ease::Fail => self.fail,
            Ease::Hard => self.hard,
            Ease::Good => self.good,
            Ease::Easy => self.easy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_round_trips_through_strings() {
        for ease in Ease::ALL {
            assert_eq!(ease.as_str().parse::<Ease>().unwrap(), ease);
        }
    }

    #[test]
    fn unknown_ease_is_rejected() {
        let err = "nonesuch".parse::<Ease>().unwrap_err();
        assert!(matches!(err, SchedulerError::UnsupportedEase(s) if s == "nonesuch"));
    }

    #[test]
    fn new_card_has_zeroed_scheduling() {
        let card = Card {
            id: 1,
            fieldset_id: 1,
            template_id: 1,
            modified: 0,
            scheduling: Scheduling::New,
            factor: 0.0,
            views: 0,
            lapses: 0,
            ord: 0,
        };
        assert!(card.is_new());
        assert_eq!(card.interval(), 0);
        assert_eq!(card.due(), 0);
        assert_eq!(card.last_interval(), 0);
    }
}
