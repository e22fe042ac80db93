//! Deadline penalty decision.
//!
//! The evaluator only decides; applying the penalty (stat decrement plus the
//! batch-wide `penalized` flag) is one store transaction, see
//! [`Database::penalize_batch`](crate::storage::Database::penalize_batch).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::model::DayBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyVerdict {
    NoBatch,
    AlreadyPenalized,
    AllCompleted,
    WithinDeadline,
    /// Deadline passed with outstanding quests; penalize now.
    Due,
}

#[derive(Debug, Clone, Copy)]
pub struct PenaltyEvaluator {
    window: Duration,
}

impl PenaltyEvaluator {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn assess(&self, today: Option<&DayBatch>, now: DateTime<Utc>) -> PenaltyVerdict {
        let Some(day) = today else {
            return PenaltyVerdict::NoBatch;
        };
        if day.batch.penalized {
            return PenaltyVerdict::AlreadyPenalized;
        }
        if day.all_completed() {
            return PenaltyVerdict::AllCompleted;
        }
        if now - day.batch.start_time > self.window {
            PenaltyVerdict::Due
        } else {
            PenaltyVerdict::WithinDeadline
        }
    }
}

impl Default for PenaltyEvaluator {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::model::{Batch, Quest};
    use chrono::TimeZone;

    fn day(penalized: bool, completed: &[bool]) -> DayBatch {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        DayBatch {
            batch: Batch {
                id: "b".into(),
                owner_id: "u".into(),
                date: start.date_naive(),
                start_time: start,
                penalized,
            },
            quests: completed
                .iter()
                .map(|done| Quest {
                    id: "q".into(),
                    owner_id: "u".into(),
                    batch_id: "b".into(),
                    title: "10 Push-ups".into(),
                    completed: *done,
                    date: start.date_naive(),
                })
                .collect(),
        }
    }

    #[test]
    fn due_after_deadline_with_pending_quest() {
        let d = day(false, &[true, false, true, true]);
        let now = d.batch.start_time + Duration::minutes(61);
        assert_eq!(PenaltyEvaluator::default().assess(Some(&d), now), PenaltyVerdict::Due);
    }

    #[test]
    fn exactly_one_hour_is_not_late() {
        let d = day(false, &[false]);
        let now = d.batch.start_time + Duration::hours(1);
        assert_eq!(
            PenaltyEvaluator::default().assess(Some(&d), now),
            PenaltyVerdict::WithinDeadline
        );
    }

    #[test]
    fn guard_flags_block_penalty() {
        let eval = PenaltyEvaluator::default();
        let late = |d: &DayBatch| d.batch.start_time + Duration::hours(3);

        let penalized = day(true, &[false]);
        assert_eq!(eval.assess(Some(&penalized), late(&penalized)), PenaltyVerdict::AlreadyPenalized);

        let done = day(false, &[true, true]);
        assert_eq!(eval.assess(Some(&done), late(&done)), PenaltyVerdict::AllCompleted);

        assert_eq!(eval.assess(None, Utc::now()), PenaltyVerdict::NoBatch);
    }
}
