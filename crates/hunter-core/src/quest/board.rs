//! The daily quest board.
//!
//! Ties the countdown, penalty evaluator and rest timer to the store for the
//! signed-in user. Every command and tick re-reads today's batch from the
//! store before deriving state, so nothing works on a stale quest list.
//!
//! The board state (urgency flag, running rest) is persisted in the kv table
//! so that separate CLI invocations see the same timers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::countdown::CountdownEngine;
use super::model::{DayBatch, Quest};
use super::penalty::{PenaltyEvaluator, PenaltyVerdict};
use super::rest::RestTimer;
use super::workout::Workout;
use crate::clock::Clock;
use crate::error::{QuestError, Result};
use crate::events::Event;
use crate::progress::Progress;
use crate::session::Session;
use crate::storage::{Database, QuestConfig};

const BOARD_KEY_PREFIX: &str = "quest_board:";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardState {
    #[serde(default)]
    pub countdown: CountdownEngine,
    #[serde(default)]
    pub rest: RestTimer,
}

/// Everything the presentation layer needs to render the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub today: NaiveDate,
    pub selected_date: NaiveDate,
    pub quests: Vec<Quest>,
    /// Countdown for today's batch, floored at zero; absent when idle.
    pub remaining_ms: Option<u64>,
    pub urgent: bool,
    pub penalized: bool,
    pub rest_remaining_secs: u64,
    pub can_complete: bool,
    pub progress: Progress,
}

pub struct QuestBoard<'a, C: Clock> {
    db: &'a Database,
    session: &'a Session,
    owner: String,
    clock: C,
    penalty: PenaltyEvaluator,
    state: BoardState,
}

impl<'a, C: Clock> QuestBoard<'a, C> {
    /// A board with fresh timers.
    ///
    /// # Errors
    /// [`QuestError::NotSignedIn`] when the session has no user.
    pub fn new(db: &'a Database, session: &'a Session, clock: C, config: &QuestConfig) -> Result<Self> {
        Self::with_state(db, session, clock, config, BoardState::default())
    }

    /// A board resuming the timers saved by [`QuestBoard::save`].
    pub fn load(db: &'a Database, session: &'a Session, clock: C, config: &QuestConfig) -> Result<Self> {
        let owner = session.require_user()?;
        let state = match db.kv_get(&format!("{BOARD_KEY_PREFIX}{owner}"))? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("discarding unreadable board state: {e}");
                BoardState::default()
            }),
            None => BoardState::default(),
        };
        Self::with_state(db, session, clock, config, state)
    }

    fn with_state(
        db: &'a Database,
        session: &'a Session,
        clock: C,
        config: &QuestConfig,
        mut state: BoardState,
    ) -> Result<Self> {
        let owner = session.require_user()?.to_string();
        let countdown = config.countdown();
        state.countdown.set_config(countdown);
        state.rest.set_duration_secs(config.rest_secs);
        Ok(Self {
            db,
            session,
            owner,
            clock,
            penalty: PenaltyEvaluator::new(countdown.window()),
            state,
        })
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.state)?;
        self.db
            .kv_set(&format!("{BOARD_KEY_PREFIX}{}", self.owner), &json)?;
        Ok(())
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Today's batch as currently stored.
    pub fn today(&self) -> Result<Option<DayBatch>> {
        self.db.day_batch(&self.owner, self.clock.today())
    }

    pub fn can_complete(&self) -> bool {
        !self.state.rest.is_active()
    }

    /// Generate today's routine. A no-op if today already has a batch.
    pub fn add_quest(&mut self) -> Result<Vec<Event>> {
        let today = self.clock.today();
        if self.db.day_batch(&self.owner, today)?.is_some() {
            tracing::debug!(%today, "batch already exists, add ignored");
            return Ok(Vec::new());
        }

        let level = self.db.progress(&self.owner)?.level;
        let titles = Workout::for_level(level).titles();
        let now = self.clock.now();

        let Some(day) = self.db.create_batch(&self.owner, today, now, &titles)? else {
            return Ok(Vec::new());
        };
        tracing::info!(batch_id = %day.batch.id, level, "daily quests created");

        let mut events = vec![Event::BatchCreated {
            batch_id: day.batch.id.clone(),
            date: today,
            titles,
            at: now,
        }];
        events.extend(self.tick_countdown()?);
        Ok(events)
    }

    /// Complete one quest, award a point and start the rest timer.
    ///
    /// # Errors
    /// [`QuestError::RestActive`] while resting; store errors otherwise.
    pub fn complete(&mut self, quest_id: &str) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let mut events: Vec<Event> = self.state.rest.tick(now).into_iter().collect();
        if self.state.rest.is_active() {
            return Err(QuestError::RestActive {
                remaining_secs: self.state.rest.remaining_secs(now),
            }
            .into());
        }

        let (quest, progress) = self.db.complete_quest(&self.owner, quest_id)?;
        tracing::info!(quest_id = %quest.id, points = progress.points, "quest completed");
        events.push(Event::QuestCompleted {
            quest_id: quest.id,
            title: quest.title,
            points: progress.points,
            at: now,
        });
        events.extend(self.tick_countdown()?);
        events.push(self.state.rest.start(now));
        Ok(events)
    }

    /// Countdown and penalty pass over the freshly read batch.
    pub fn tick_countdown(&mut self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let day = self.today()?;
        let mut events = Vec::new();

        if let Some(event) = self.state.countdown.tick(day.as_ref(), now) {
            events.push(event);
        }

        if let (PenaltyVerdict::Due, Some(day)) = (self.penalty.assess(day.as_ref(), now), &day) {
            match self.db.penalize_batch(&self.owner, &day.batch.id)? {
                Some(progress) => {
                    tracing::info!(batch_id = %day.batch.id, "deadline missed, penalty applied");
                    events.push(Event::PenaltyApplied {
                        batch_id: day.batch.id.clone(),
                        window_ms: self.state.countdown.config().window_ms,
                        xp: progress.xp,
                        points: progress.points,
                        at: now,
                    });
                }
                None => tracing::debug!("penalty already settled"),
            }
        }

        Ok(events)
    }

    pub fn tick_rest(&mut self) -> Option<Event> {
        self.state.rest.tick(self.clock.now())
    }

    /// One full 1 s tick: countdown, penalty, rest.
    pub fn tick(&mut self) -> Result<Vec<Event>> {
        let mut events = self.tick_countdown()?;
        events.extend(self.tick_rest());
        Ok(events)
    }

    /// Quests for the session's selected date.
    pub fn selected_quests(&self) -> Result<Vec<Quest>> {
        self.db.quests_on(&self.owner, self.session.selected_date)
    }

    /// Resolve a 1-based position in the selected date's list, or a quest id.
    pub fn resolve(&self, selector: &str) -> Result<String> {
        let quests = self.selected_quests()?;
        if let Ok(n) = selector.trim().parse::<usize>() {
            if let Some(q) = n.checked_sub(1).and_then(|i| quests.get(i)) {
                return Ok(q.id.clone());
            }
            return Err(QuestError::NotFound(selector.to_string()).into());
        }
        Ok(selector.trim().to_string())
    }

    pub fn snapshot(&self) -> Result<BoardSnapshot> {
        let now = self.clock.now();
        let penalized = self.today()?.is_some_and(|d| d.batch.penalized);
        Ok(BoardSnapshot {
            today: now.date_naive(),
            selected_date: self.session.selected_date,
            quests: self.selected_quests()?,
            remaining_ms: self.state.countdown.display_remaining_ms(),
            urgent: self.state.countdown.is_urgent(),
            penalized,
            rest_remaining_secs: self.state.rest.remaining_secs(now),
            can_complete: self.can_complete(),
            progress: self.db.progress(&self.owner)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Profile;
    use crate::quest::MAX_REST_SECS;
    use crate::clock::ManualClock;
    use crate::error::CoreError;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 7, 0, 0).unwrap()
    }

    fn setup(progress: Progress) -> (Database, Session, ManualClock) {
        let db = Database::open_memory().unwrap();
        let profile = Profile {
            email: "jinwoo@hunters.kr".into(),
            name: "Jinwoo".into(),
            age: 24,
            height_cm: 180.0,
            weight_kg: 70.0,
            activity: "moderate".into(),
        };
        db.insert_user("hunter", &profile, "s", "d", t0()).unwrap();
        db.save_progress("hunter", &progress).unwrap();
        let mut session = Session::new(t0().date_naive());
        session.sign_in("hunter", t0().date_naive());
        (db, session, ManualClock::new(t0()))
    }

    #[test]
    fn requires_signed_in_session() {
        let db = Database::open_memory().unwrap();
        let session = Session::new(t0().date_naive());
        let result = QuestBoard::new(&db, &session, ManualClock::new(t0()), &QuestConfig::default());
        assert!(matches!(result, Err(CoreError::Quest(QuestError::NotSignedIn))));
    }

    #[test]
    fn add_quest_is_idempotent_per_day() {
        let (db, session, clock) = setup(Progress::default());
        let mut board = QuestBoard::new(&db, &session, clock.clone(), &QuestConfig::default()).unwrap();

        let events = board.add_quest().unwrap();
        assert!(matches!(events[0], Event::BatchCreated { .. }));
        for _ in 0..3 {
            clock.advance(Duration::minutes(1));
            assert!(board.add_quest().unwrap().is_empty());
        }
        assert_eq!(board.today().unwrap().unwrap().quests.len(), 4);
    }

    #[test]
    fn level_five_gets_harder_routine() {
        let (db, session, clock) = setup(Progress {
            level: 5,
            ..Progress::default()
        });
        let mut board = QuestBoard::new(&db, &session, clock, &QuestConfig::default()).unwrap();
        board.add_quest().unwrap();
        let titles: Vec<_> = board
            .today()
            .unwrap()
            .unwrap()
            .quests
            .into_iter()
            .map(|q| q.title)
            .collect();
        assert_eq!(titles, ["15 Push-ups", "20 Sit-ups", "25 Squats", "40 Jumping Jacks"]);
    }

    #[test]
    fn completion_starts_rest_and_blocks_next_completion() {
        let (db, session, clock) = setup(Progress::default());
        let mut board = QuestBoard::new(&db, &session, clock.clone(), &QuestConfig::default()).unwrap();
        board.add_quest().unwrap();
        let ids: Vec<String> = board.today().unwrap().unwrap().quests.into_iter().map(|q| q.id).collect();

        let events = board.complete(&ids[0]).unwrap();
        assert!(events.iter().any(|e| matches!(e, Event::QuestCompleted { points: 1, .. })));
        assert!(events.iter().any(|e| matches!(e, Event::RestStarted { duration_secs: 30, .. })));
        assert!(!board.can_complete());

        clock.advance(Duration::seconds(29));
        assert!(board.tick_rest().is_none());
        let err = board.complete(&ids[1]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Quest(QuestError::RestActive { remaining_secs: 1 })
        ));

        clock.advance(Duration::seconds(1));
        assert!(matches!(board.tick_rest(), Some(Event::RestFinished { .. })));
        assert!(board.can_complete());
        board.complete(&ids[1]).unwrap();
        assert_eq!(db.progress("hunter").unwrap().points, 2);
    }

    #[test]
    fn finishing_every_quest_clears_countdown() {
        let (db, session, clock) = setup(Progress::default());
        let config = QuestConfig {
            rest_secs: 0,
            ..QuestConfig::default()
        };
        let mut board = QuestBoard::new(&db, &session, clock.clone(), &config).unwrap();
        board.add_quest().unwrap();
        assert!(board.state().countdown.is_running());

        let ids: Vec<String> = board.today().unwrap().unwrap().quests.into_iter().map(|q| q.id).collect();
        clock.advance(Duration::minutes(10));
        let mut events = Vec::new();
        for id in &ids {
            events.extend(board.complete(id).unwrap());
        }
        assert!(events.iter().any(|e| matches!(e, Event::CountdownCleared { .. })));

        board.tick().unwrap();
        assert_eq!(board.snapshot().unwrap().remaining_ms, None);
    }

    #[test]
    fn missed_deadline_penalizes_exactly_once() {
        let (db, session, clock) = setup(Progress {
            xp: 35,
            points: 4,
            ..Progress::default()
        });
        let mut board = QuestBoard::new(&db, &session, clock.clone(), &QuestConfig::default()).unwrap();
        board.add_quest().unwrap();

        clock.advance(Duration::minutes(61));
        let events = board.tick().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::PenaltyApplied { xp: 25, points: 3, .. })));

        for _ in 0..5 {
            clock.advance(Duration::seconds(1));
            let events = board.tick().unwrap();
            assert!(!events.iter().any(|e| matches!(e, Event::PenaltyApplied { .. })));
        }
        let progress = db.progress("hunter").unwrap();
        assert_eq!((progress.xp, progress.points), (25, 3));
        assert!(board.snapshot().unwrap().penalized);
    }

    #[test]
    fn penalty_reports_configured_window() {
        let (db, session, clock) = setup(Progress::default());
        let config = QuestConfig {
            deadline_mins: 30,
            ..QuestConfig::default()
        };
        let mut board = QuestBoard::new(&db, &session, clock.clone(), &config).unwrap();
        board.add_quest().unwrap();

        clock.advance(Duration::minutes(31));
        let events = board.tick().unwrap();
        let penalty = events
            .iter()
            .find(|e| matches!(e, Event::PenaltyApplied { window_ms: 1_800_000, .. }))
            .unwrap();
        assert!(penalty.message().contains("within 30 minutes."));
    }

    #[test]
    fn oversized_rest_setting_does_not_overflow() {
        let (db, session, clock) = setup(Progress::default());
        let config = QuestConfig {
            rest_secs: u64::MAX,
            ..QuestConfig::default()
        };
        let mut board = QuestBoard::new(&db, &session, clock.clone(), &config).unwrap();
        board.add_quest().unwrap();
        let id = board.resolve("1").unwrap();
        board.complete(&id).unwrap();
        assert_eq!(board.snapshot().unwrap().rest_remaining_secs, MAX_REST_SECS);

        clock.advance(Duration::seconds(MAX_REST_SECS as i64));
        assert!(board.tick_rest().is_some());
        assert!(board.can_complete());
    }

    #[test]
    fn urgent_warning_fires_once() {
        let (db, session, clock) = setup(Progress::default());
        let mut board = QuestBoard::new(&db, &session, clock.clone(), &QuestConfig::default()).unwrap();
        board.add_quest().unwrap();

        clock.advance(Duration::minutes(55) + Duration::seconds(1));
        let urgent = |events: &[Event]| {
            events
                .iter()
                .filter(|e| matches!(e, Event::CountdownUrgent { .. }))
                .count()
        };
        assert_eq!(urgent(&board.tick().unwrap()), 1);
        clock.advance(Duration::seconds(1));
        assert_eq!(urgent(&board.tick().unwrap()), 0);
        assert!(board.snapshot().unwrap().urgent);
    }

    #[test]
    fn state_survives_save_and_load() {
        let (db, session, clock) = setup(Progress::default());
        let config = QuestConfig::default();
        {
            let mut board = QuestBoard::new(&db, &session, clock.clone(), &config).unwrap();
            board.add_quest().unwrap();
            let id = board.resolve("1").unwrap();
            board.complete(&id).unwrap();
            board.save().unwrap();
        }

        clock.advance(Duration::seconds(10));
        let board = QuestBoard::load(&db, &session, clock.clone(), &config).unwrap();
        assert!(!board.can_complete());
        assert_eq!(board.snapshot().unwrap().rest_remaining_secs, 20);
    }

    #[test]
    fn resolve_rejects_out_of_range_index() {
        let (db, session, clock) = setup(Progress::default());
        let mut board = QuestBoard::new(&db, &session, clock, &QuestConfig::default()).unwrap();
        board.add_quest().unwrap();
        assert!(board.resolve("0").is_err());
        assert!(board.resolve("5").is_err());
        assert!(board.resolve("4").is_ok());
    }
}
