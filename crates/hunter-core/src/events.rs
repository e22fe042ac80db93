use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::Stat;

/// Every state change in the quest board produces an Event.
/// The presentation layer renders them; cues are keyed off them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    BatchCreated {
        batch_id: String,
        date: NaiveDate,
        titles: Vec<String>,
        at: DateTime<Utc>,
    },
    QuestCompleted {
        quest_id: String,
        title: String,
        points: u32,
        at: DateTime<Utc>,
    },
    /// Remaining time dropped under the urgency threshold.
    CountdownUrgent {
        remaining_ms: i64,
        threshold_ms: i64,
        at: DateTime<Utc>,
    },
    /// Remaining time back at or above the urgency threshold.
    CountdownCalm {
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    /// Every quest of today's batch is done; countdown stopped.
    CountdownCleared {
        at: DateTime<Utc>,
    },
    PenaltyApplied {
        batch_id: String,
        /// Deadline window that was missed.
        window_ms: i64,
        xp: u32,
        points: u32,
        at: DateTime<Utc>,
    },
    RestStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    RestFinished {
        at: DateTime<Utc>,
    },
    StatUpgraded {
        stat: Stat,
        value: u32,
        points: u32,
        xp: u32,
        at: DateTime<Utc>,
    },
    LevelUp {
        level: u32,
        at: DateTime<Utc>,
    },
    AchievementUnlocked {
        name: String,
        at: DateTime<Utc>,
    },
    /// Audio playback was refused; the user must interact to unlock sound.
    AudioBlocked {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// One-line, human readable rendering.
    pub fn message(&self) -> String {
        match self {
            Event::BatchCreated { titles, .. } => {
                format!("New daily quests: {}", titles.join(", "))
            }
            Event::QuestCompleted { title, points, .. } => {
                format!("Completed {title} (points: {points})")
            }
            Event::CountdownUrgent { threshold_ms, .. } => {
                format!("Less than {} left!", describe_span(*threshold_ms))
            }
            Event::CountdownCalm { .. } => "Time is no longer urgent".to_string(),
            Event::CountdownCleared { .. } => "All quests completed".to_string(),
            Event::PenaltyApplied { window_ms, .. } => format!(
                "Penalty! You didn't complete your quests within {}. XP -10 | Points -1",
                describe_span(*window_ms)
            ),
            Event::RestStarted { duration_secs, .. } => {
                format!("Rest for {duration_secs}s before the next quest")
            }
            Event::RestFinished { .. } => "Rest over, next quest unlocked".to_string(),
            Event::StatUpgraded { stat, value, .. } => {
                format!("{} increased to {value}!", stat.label())
            }
            Event::LevelUp { level, .. } => format!("Level up! You are now level {level}"),
            Event::AchievementUnlocked { name, .. } => format!("Achievement unlocked: {name}"),
            Event::AudioBlocked { .. } => {
                "Audio playback was blocked. Interact with the app to enable sound.".to_string()
            }
        }
    }
}

/// "1 hour", "5 minutes", "90 seconds".
fn describe_span(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    let (n, unit) = if secs > 0 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs > 0 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
