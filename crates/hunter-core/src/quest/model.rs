use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The set of quests generated together for one user on one day.
///
/// Start time and penalty flag live here, so every item of the day
/// shares them by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub owner_id: String,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub penalized: bool,
}

/// A single exercise task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub owner_id: String,
    pub batch_id: String,
    pub title: String,
    pub completed: bool,
    pub date: NaiveDate,
}

/// A batch together with its quest items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBatch {
    pub batch: Batch,
    pub quests: Vec<Quest>,
}

impl DayBatch {
    pub fn all_completed(&self) -> bool {
        self.quests.iter().all(|q| q.completed)
    }

    pub fn pending(&self) -> usize {
        self.quests.iter().filter(|q| !q.completed).count()
    }

    pub fn deadline(&self, window: Duration) -> DateTime<Utc> {
        self.batch.start_time + window
    }

    /// Signed milliseconds until the deadline; negative once it has passed.
    pub fn remaining_ms(&self, window: Duration, now: DateTime<Utc>) -> i64 {
        (self.deadline(window) - now).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(completed: &[bool]) -> DayBatch {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        DayBatch {
            batch: Batch {
                id: "b".into(),
                owner_id: "u".into(),
                date: start.date_naive(),
                start_time: start,
                penalized: false,
            },
            quests: completed
                .iter()
                .enumerate()
                .map(|(i, done)| Quest {
                    id: format!("q{i}"),
                    owner_id: "u".into(),
                    batch_id: "b".into(),
                    title: format!("quest {i}"),
                    completed: *done,
                    date: start.date_naive(),
                })
                .collect(),
        }
    }

    #[test]
    fn pending_counts_incomplete_items() {
        let d = day(&[true, false, false, true]);
        assert_eq!(d.pending(), 2);
        assert!(!d.all_completed());
        assert!(day(&[true, true]).all_completed());
    }

    #[test]
    fn remaining_goes_negative_after_deadline() {
        let d = day(&[false]);
        let now = d.batch.start_time + Duration::minutes(61);
        assert_eq!(d.remaining_ms(Duration::hours(1), now), -60_000);
    }
}
