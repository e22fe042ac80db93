//! Daily quests: the generated routine, its one-hour deadline, the urgency
//! countdown, the rest cooldown between completions, and the board that
//! drives them against the store.

mod board;
mod countdown;
mod model;
mod penalty;
mod rest;
mod ticker;
mod workout;

pub use board::{BoardSnapshot, BoardState, QuestBoard};
pub use countdown::{
    format_remaining, CountdownConfig, CountdownEngine, DEFAULT_DEADLINE_MINS, DEFAULT_URGENT_SECS,
};
pub use model::{Batch, DayBatch, Quest};
pub use penalty::{PenaltyEvaluator, PenaltyVerdict};
pub use rest::{RestTimer, DEFAULT_REST_SECS, MAX_REST_SECS};
pub use ticker::{TickSource, Ticker};
pub use workout::Workout;
