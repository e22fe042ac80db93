//! Countdown engine for today's quest batch.
//!
//! Like the rest of the quest engine it holds no thread: the caller invokes
//! [`CountdownEngine::tick`] once per second with the freshly read batch and
//! the current wall-clock time.
//!
//! ## Urgency
//!
//! ```text
//! calm --(0 < remaining < threshold)--> urgent --(remaining >= threshold)--> calm
//! ```
//!
//! Each calm -> urgent edge emits exactly one [`Event::CountdownUrgent`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::model::DayBatch;
use crate::events::Event;

pub const DEFAULT_DEADLINE_MINS: i64 = 60;
pub const DEFAULT_URGENT_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// Completion window measured from the batch start time.
    pub window_ms: i64,
    /// Remaining time under which the countdown turns urgent.
    pub urgent_ms: i64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_DEADLINE_MINS * 60 * 1000,
            urgent_ms: DEFAULT_URGENT_SECS * 1000,
        }
    }
}

impl CountdownConfig {
    pub fn window(&self) -> Duration {
        Duration::milliseconds(self.window_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEngine {
    config: CountdownConfig,
    /// Batch the engine is armed for. A different batch re-arms it.
    #[serde(default)]
    batch_id: Option<String>,
    /// Signed remaining time; `None` when nothing is counting down.
    #[serde(default)]
    remaining_ms: Option<i64>,
    #[serde(default)]
    urgent: bool,
}

impl CountdownEngine {
    pub fn new(config: CountdownConfig) -> Self {
        Self {
            config,
            batch_id: None,
            remaining_ms: None,
            urgent: false,
        }
    }

    pub fn config(&self) -> CountdownConfig {
        self.config
    }

    /// Replace the thresholds, keeping the armed batch.
    pub fn set_config(&mut self, config: CountdownConfig) {
        self.config = config;
    }

    pub fn is_urgent(&self) -> bool {
        self.urgent
    }

    /// Unclamped remaining time.
    pub fn remaining_ms(&self) -> Option<i64> {
        self.remaining_ms
    }

    /// Remaining time as shown to the user, floored at zero.
    pub fn display_remaining_ms(&self) -> Option<u64> {
        self.remaining_ms.map(|ms| ms.max(0) as u64)
    }

    pub fn is_running(&self) -> bool {
        self.remaining_ms.is_some()
    }

    /// Re-derive the countdown from today's batch.
    pub fn tick(&mut self, today: Option<&DayBatch>, now: DateTime<Utc>) -> Option<Event> {
        let Some(day) = today else {
            self.disarm();
            return None;
        };

        if self.batch_id.as_deref() != Some(day.batch.id.as_str()) {
            tracing::debug!(batch_id = %day.batch.id, "countdown re-armed");
            self.disarm();
            self.batch_id = Some(day.batch.id.clone());
        }

        if day.all_completed() {
            let was_running = self.remaining_ms.take().is_some();
            self.urgent = false;
            return was_running.then_some(Event::CountdownCleared { at: now });
        }

        let remaining = day.remaining_ms(self.config.window(), now);
        self.remaining_ms = Some(remaining);

        if remaining > 0 && remaining < self.config.urgent_ms && !self.urgent {
            self.urgent = true;
            tracing::info!(remaining_ms = remaining, "countdown turned urgent");
            Some(Event::CountdownUrgent {
                remaining_ms: remaining,
                threshold_ms: self.config.urgent_ms,
                at: now,
            })
        } else if remaining >= self.config.urgent_ms && self.urgent {
            self.urgent = false;
            Some(Event::CountdownCalm {
                remaining_ms: remaining,
                at: now,
            })
        } else {
            None
        }
    }

    fn disarm(&mut self) {
        self.batch_id = None;
        self.remaining_ms = None;
        self.urgent = false;
    }
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new(CountdownConfig::default())
    }
}

/// `MM:SS`, or `00:00` once time is up.
pub fn format_remaining(ms: i64) -> String {
    if ms <= 0 {
        return "00:00".to_string();
    }
    let min = ms / 60_000;
    let sec = (ms % 60_000) / 1000;
    format!("{min:02}:{sec:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::model::{Batch, Quest};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn batch(id: &str, completed: &[bool]) -> DayBatch {
        let start = start();
        DayBatch {
            batch: Batch {
                id: id.into(),
                owner_id: "hunter".into(),
                date: start.date_naive(),
                start_time: start,
                penalized: false,
            },
            quests: completed
                .iter()
                .enumerate()
                .map(|(i, done)| Quest {
                    id: format!("{id}-{i}"),
                    owner_id: "hunter".into(),
                    batch_id: id.into(),
                    title: format!("quest {i}"),
                    completed: *done,
                    date: start.date_naive(),
                })
                .collect(),
        }
    }

    /// Instant at which `remaining_ms` is left on a one-hour window.
    fn at_remaining(remaining_ms: i64) -> DateTime<Utc> {
        start() + Duration::hours(1) - Duration::milliseconds(remaining_ms)
    }

    #[test]
    fn no_batch_means_no_countdown() {
        let mut engine = CountdownEngine::default();
        assert!(engine.tick(None, start()).is_none());
        assert_eq!(engine.remaining_ms(), None);
        assert!(!engine.is_urgent());
    }

    #[test]
    fn all_completed_clears_regardless_of_elapsed_time() {
        let mut engine = CountdownEngine::default();
        let day = batch("b", &[false, true, true, true]);
        engine.tick(Some(&day), start() + Duration::minutes(5));
        assert!(engine.is_running());

        let done = batch("b", &[true, true, true, true]);
        let event = engine.tick(Some(&done), start() + Duration::minutes(10));
        assert!(matches!(event, Some(Event::CountdownCleared { .. })));
        assert_eq!(engine.display_remaining_ms(), None);

        // Stays cleared without repeating the event.
        assert!(engine.tick(Some(&done), start() + Duration::minutes(11)).is_none());
        assert_eq!(engine.remaining_ms(), None);
    }

    #[test]
    fn urgency_threshold_is_strict() {
        let day = batch("b", &[false; 4]);
        let mut engine = CountdownEngine::default();

        assert!(engine.tick(Some(&day), at_remaining(301_000)).is_none());
        assert!(!engine.is_urgent());

        assert!(engine.tick(Some(&day), at_remaining(300_000)).is_none());
        assert!(!engine.is_urgent());

        let event = engine.tick(Some(&day), at_remaining(299_000));
        assert!(matches!(event, Some(Event::CountdownUrgent { remaining_ms: 299_000, .. })));
        assert!(engine.is_urgent());

        // Only once while urgent.
        assert!(engine.tick(Some(&day), at_remaining(298_000)).is_none());
        assert!(engine.is_urgent());
    }

    #[test]
    fn urgency_clears_when_time_is_back_above_threshold() {
        let day = batch("b", &[false; 4]);
        let mut engine = CountdownEngine::default();
        engine.tick(Some(&day), at_remaining(120_000));
        assert!(engine.is_urgent());

        let event = engine.tick(Some(&day), at_remaining(300_000));
        assert!(matches!(event, Some(Event::CountdownCalm { .. })));
        assert!(!engine.is_urgent());
    }

    #[test]
    fn expired_countdown_displays_zero() {
        let day = batch("b", &[false; 4]);
        let mut engine = CountdownEngine::default();
        engine.tick(Some(&day), start() + Duration::minutes(61));
        assert_eq!(engine.remaining_ms(), Some(-60_000));
        assert_eq!(engine.display_remaining_ms(), Some(0));
        // Already past zero: the warning never fires.
        assert!(!engine.is_urgent());
    }

    #[test]
    fn new_batch_rearms_engine() {
        let mut engine = CountdownEngine::default();
        let first = batch("first", &[false; 4]);
        engine.tick(Some(&first), at_remaining(60_000));
        assert!(engine.is_urgent());

        let second = batch("second", &[false; 4]);
        let event = engine.tick(Some(&second), at_remaining(3_000_000));
        assert!(event.is_none());
        assert!(!engine.is_urgent());
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(-5), "00:00");
        assert_eq!(format_remaining(299_000), "04:59");
        assert_eq!(format_remaining(3_600_000), "60:00");
    }

    proptest! {
        #[test]
        fn urgent_iff_remaining_strictly_inside_threshold(remaining in -600_000i64..3_600_000) {
            let day = batch("p", &[false; 4]);
            let mut engine = CountdownEngine::default();
            engine.tick(Some(&day), at_remaining(remaining));
            prop_assert_eq!(engine.is_urgent(), remaining > 0 && remaining < 300_000);
        }
    }
}
