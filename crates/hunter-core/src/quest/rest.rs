//! Rest timer: a short cooldown after each completed quest.
//!
//! Wall-clock based, like the countdown. While active, no quest can be
//! completed. Starting a new rest replaces the running one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;

pub const DEFAULT_REST_SECS: u64 = 30;
/// Longest rest the timer will run; longer settings are clamped.
pub const MAX_REST_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestTimer {
    duration_secs: u64,
    #[serde(default)]
    ends_at: Option<DateTime<Utc>>,
}

impl RestTimer {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs: duration_secs.min(MAX_REST_SECS),
            ends_at: None,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn set_duration_secs(&mut self, secs: u64) {
        self.duration_secs = secs.min(MAX_REST_SECS);
    }

    pub fn is_active(&self) -> bool {
        self.ends_at.is_some()
    }

    /// Whole seconds left, rounded up to the 1 s tick.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        match self.ends_at {
            Some(end) => {
                let ms = (end - now).num_milliseconds();
                if ms <= 0 {
                    0
                } else {
                    (ms as u64).div_ceil(1000)
                }
            }
            None => 0,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Event {
        if self.is_active() {
            tracing::debug!("rest timer replaced");
        }
        // A deserialized duration may bypass the setters.
        self.duration_secs = self.duration_secs.min(MAX_REST_SECS);
        self.ends_at = Some(now + Duration::seconds(self.duration_secs as i64));
        Event::RestStarted {
            duration_secs: self.duration_secs,
            at: now,
        }
    }

    /// Call once per second. Returns `RestFinished` when the rest runs out.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.is_active() && self.remaining_secs(now) == 0 {
            self.ends_at = None;
            return Some(Event::RestFinished { at: now });
        }
        None
    }

    pub fn cancel(&mut self) {
        self.ends_at = None;
    }
}

impl Default for RestTimer {
    fn default() -> Self {
        Self::new(DEFAULT_REST_SECS)
    }
}
