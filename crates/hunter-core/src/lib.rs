//! # Hunterquest Core Library
//!
//! This library provides the core logic for Hunterquest, a gamified daily
//! workout tracker. Every operation is available through the standalone CLI
//! binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Quest board**: wall-clock driven; the caller invokes `tick()` once a
//!   second and renders the returned events
//! - **Progress**: points, stat upgrades, XP, levels and achievements
//! - **Storage**: SQLite for users, quests and evaluations; TOML for
//!   configuration
//! - **Session**: the signed-in user and the selected date, passed to every
//!   screen by reference
//!
//! ## Key Components
//!
//! - [`QuestBoard`]: daily routine, countdown, deadline penalty, rest timer
//! - [`Progress`]: per-user game state
//! - [`Database`]: persistence, with transactional multi-record writes
//! - [`Config`]: application configuration management

pub mod account;
pub mod clock;
pub mod cue;
pub mod error;
pub mod evaluation;
pub mod events;
pub mod progress;
pub mod quest;
pub mod session;
pub mod storage;

pub use account::{Profile, Registration};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cue::{Announcer, Cue, CueError, CuePlayer, SilentPlayer};
pub use error::{
    AccountError, ConfigError, CoreError, DatabaseError, ProgressError, QuestError,
    ValidationError,
};
pub use evaluation::{FitnessLevel, Measurement, ReEvaluation};
pub use events::Event;
pub use progress::{Progress, Stat, Standing};
pub use quest::{BoardSnapshot, DayBatch, Quest, QuestBoard, Ticker, TickSource};
pub use session::Session;
pub use storage::{Config, Database};
