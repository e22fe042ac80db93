//! SQLite-backed document store.
//!
//! Provides persistent storage for:
//! - User profiles and progress (stats, points, XP, level, achievements)
//! - Daily quest batches and their quest items
//! - Body evaluations
//! - Key-value store for session and screen state
//!
//! Writes that touch several records (batch creation, completion, penalty)
//! run inside one transaction.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use super::migrations;
use crate::account::Profile;
use crate::error::{DatabaseError, ProgressError, QuestError, Result};
use crate::evaluation::{FitnessLevel, Measurement, ReEvaluation};
use crate::progress::{Progress, StandingRow};
use crate::quest::{Batch, DayBatch, Quest};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity: String,
    pub created_at: DateTime<Utc>,
    pub progress: Progress,
    pub reevaluation: Option<ReEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: String,
    pub owner_id: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub recorded_at: DateTime<Utc>,
}

const PROGRESS_COLUMNS: &str = "strength, stamina, agility, points, xp, level, achievements";
const QUEST_COLUMNS: &str = "id, owner_id, batch_id, title, completed, date";

/// SQLite database for users, quests and evaluations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/hunter.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("hunter.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .and_then(|_| migrations::migrate(&self.conn))
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────────────

    /// Insert a new user with default progress. Returns `false` if the
    /// email is already registered.
    pub fn insert_user(
        &self,
        id: &str,
        profile: &Profile,
        password_salt: &str,
        password_digest: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let taken: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![profile.email],
            |row| row.get(0),
        )?;
        if taken {
            return Ok(false);
        }
        tx.execute(
            "INSERT INTO users (id, email, name, age, height_cm, weight_kg, activity,
                                password_salt, password_digest, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                profile.email,
                profile.name,
                profile.age,
                profile.height_cm,
                profile.weight_kg,
                profile.activity,
                password_salt,
                password_digest,
                created_at,
            ],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// `(user id, salt, digest)` for an email.
    pub fn credentials(&self, email: &str) -> Result<Option<(String, String, String)>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, password_salt, password_digest FROM users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        Ok(found)
    }

    pub fn user(&self, id: &str) -> Result<Option<UserRecord>> {
        let sql = format!(
            "SELECT id, email, name, age, height_cm, weight_kg, activity, created_at,
                    strength_level, endurance_level, reevaluated_at, {PROGRESS_COLUMNS}
             FROM users WHERE id = ?1"
        );
        let found = self
            .conn
            .query_row(&sql, params![id], |row| {
                let reevaluation = match (
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<String>>(9)?,
                    row.get::<_, Option<DateTime<Utc>>>(10)?,
                ) {
                    (Some(s), Some(e), Some(at)) => Some(ReEvaluation {
                        strength_level: parse_level(8, &s)?,
                        endurance_level: parse_level(9, &e)?,
                        completed_at: at,
                    }),
                    _ => None,
                };
                Ok(UserRecord {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    name: row.get(2)?,
                    age: row.get(3)?,
                    height_cm: row.get(4)?,
                    weight_kg: row.get(5)?,
                    activity: row.get(6)?,
                    created_at: row.get(7)?,
                    progress: progress_from_row(row, 11)?,
                    reevaluation,
                })
            })
            .optional()?;
        Ok(found)
    }

    /// # Errors
    /// [`ProgressError::UserNotFound`] if there is no such user.
    pub fn progress(&self, user_id: &str) -> Result<Progress> {
        load_progress(&self.conn, user_id)
    }

    pub fn save_progress(&self, user_id: &str, progress: &Progress) -> Result<()> {
        store_progress(&self.conn, user_id, progress)
    }

    pub fn standing_rows(&self) -> Result<Vec<StandingRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email, level, xp FROM users ORDER BY xp DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok(StandingRow {
                user_id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                level: row.get(3)?,
                xp: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn save_reevaluation(&self, user_id: &str, reevaluation: &ReEvaluation) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE users SET strength_level = ?2, endurance_level = ?3, reevaluated_at = ?4
             WHERE id = ?1",
            params![
                user_id,
                reevaluation.strength_level.as_str(),
                reevaluation.endurance_level.as_str(),
                reevaluation.completed_at,
            ],
        )?;
        if changed == 0 {
            return Err(ProgressError::UserNotFound(user_id.to_string()).into());
        }
        Ok(())
    }

    // ── Evaluations ──────────────────────────────────────────────────

    pub fn record_evaluation(
        &self,
        owner_id: &str,
        measurement: &Measurement,
        recorded_at: DateTime<Utc>,
    ) -> Result<EvaluationRecord> {
        let record = EvaluationRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            height_cm: measurement.height_cm,
            weight_kg: measurement.weight_kg,
            recorded_at,
        };
        self.conn.execute(
            "INSERT INTO evaluations (id, owner_id, height_cm, weight_kg, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.owner_id,
                record.height_cm,
                record.weight_kg,
                record.recorded_at,
            ],
        )?;
        Ok(record)
    }

    /// Newest first.
    pub fn evaluations(&self, owner_id: &str) -> Result<Vec<EvaluationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, height_cm, weight_kg, recorded_at
             FROM evaluations WHERE owner_id = ?1
             ORDER BY recorded_at DESC",
        )?;
        let rows = stmt.query_map(params![owner_id], |row| {
            Ok(EvaluationRecord {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                height_cm: row.get(2)?,
                weight_kg: row.get(3)?,
                recorded_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Quests ───────────────────────────────────────────────────────

    /// Create the day's batch with one quest per title, atomically.
    ///
    /// Returns `None` without writing anything if the owner already has a
    /// batch for `date`.
    pub fn create_batch(
        &self,
        owner_id: &str,
        date: NaiveDate,
        start_time: DateTime<Utc>,
        titles: &[String],
    ) -> Result<Option<DayBatch>> {
        let tx = self.conn.unchecked_transaction()?;
        if find_batch(&tx, owner_id, date)?.is_some() {
            return Ok(None);
        }

        let batch = Batch {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            date,
            start_time,
            penalized: false,
        };
        tx.execute(
            "INSERT INTO quest_batches (id, owner_id, date, start_time, penalized)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![batch.id, batch.owner_id, batch.date, batch.start_time],
        )?;

        let mut quests = Vec::with_capacity(titles.len());
        for (position, title) in titles.iter().enumerate() {
            let quest = Quest {
                id: Uuid::new_v4().to_string(),
                owner_id: owner_id.to_string(),
                batch_id: batch.id.clone(),
                title: title.clone(),
                completed: false,
                date,
            };
            tx.execute(
                "INSERT INTO quests (id, owner_id, batch_id, position, title, completed, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                params![
                    quest.id,
                    quest.owner_id,
                    quest.batch_id,
                    position as i64,
                    quest.title,
                    quest.date,
                ],
            )?;
            quests.push(quest);
        }

        tx.commit()?;
        Ok(Some(DayBatch { batch, quests }))
    }

    pub fn day_batch(&self, owner_id: &str, date: NaiveDate) -> Result<Option<DayBatch>> {
        let Some(batch) = find_batch(&self.conn, owner_id, date)? else {
            return Ok(None);
        };
        let quests = self.quests_on(owner_id, date)?;
        Ok(Some(DayBatch { batch, quests }))
    }

    pub fn quests_on(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Quest>> {
        let sql = format!(
            "SELECT {QUEST_COLUMNS} FROM quests
             WHERE owner_id = ?1 AND date = ?2
             ORDER BY position"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![owner_id, date], quest_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Mark a quest completed and award one point, atomically.
    ///
    /// # Errors
    /// [`QuestError::NotFound`] if the quest doesn't exist or belongs to
    /// someone else, [`QuestError::AlreadyCompleted`] if it is already done.
    pub fn complete_quest(&self, owner_id: &str, quest_id: &str) -> Result<(Quest, Progress)> {
        let tx = self.conn.unchecked_transaction()?;
        let sql = format!("SELECT {QUEST_COLUMNS} FROM quests WHERE id = ?1 AND owner_id = ?2");
        let mut quest = tx
            .query_row(&sql, params![quest_id, owner_id], quest_from_row)
            .optional()?
            .ok_or_else(|| QuestError::NotFound(quest_id.to_string()))?;
        if quest.completed {
            return Err(QuestError::AlreadyCompleted(quest_id.to_string()).into());
        }

        tx.execute("UPDATE quests SET completed = 1 WHERE id = ?1", params![quest_id])?;
        quest.completed = true;

        let mut progress = load_progress(&tx, owner_id)?;
        progress.award_completion();
        store_progress(&tx, owner_id, &progress)?;

        tx.commit()?;
        Ok((quest, progress))
    }

    /// Apply the deadline penalty to a batch, atomically: flag the batch and
    /// deduct XP/points in one transaction.
    ///
    /// Returns `None` (and changes nothing) if the batch is already penalized
    /// or has no pending quest left.
    pub fn penalize_batch(&self, owner_id: &str, batch_id: &str) -> Result<Option<Progress>> {
        let tx = self.conn.unchecked_transaction()?;

        let pending: i64 = tx.query_row(
            "SELECT COUNT(*) FROM quests WHERE batch_id = ?1 AND completed = 0",
            params![batch_id],
            |row| row.get(0),
        )?;
        if pending == 0 {
            return Ok(None);
        }

        let flagged = tx.execute(
            "UPDATE quest_batches SET penalized = 1
             WHERE id = ?1 AND owner_id = ?2 AND penalized = 0",
            params![batch_id, owner_id],
        )?;
        if flagged == 0 {
            return Ok(None);
        }

        let mut progress = load_progress(&tx, owner_id)?;
        progress.apply_penalty();
        store_progress(&tx, owner_id, &progress)?;

        tx.commit()?;
        Ok(Some(progress))
    }
}

fn find_batch(conn: &Connection, owner_id: &str, date: NaiveDate) -> Result<Option<Batch>> {
    let batch = conn
        .query_row(
            "SELECT id, owner_id, date, start_time, penalized
             FROM quest_batches WHERE owner_id = ?1 AND date = ?2",
            params![owner_id, date],
            |row| {
                Ok(Batch {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    date: row.get(2)?,
                    start_time: row.get(3)?,
                    penalized: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(batch)
}

fn quest_from_row(row: &Row<'_>) -> rusqlite::Result<Quest> {
    Ok(Quest {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        batch_id: row.get(2)?,
        title: row.get(3)?,
        completed: row.get(4)?,
        date: row.get(5)?,
    })
}

fn load_progress(conn: &Connection, user_id: &str) -> Result<Progress> {
    let sql = format!("SELECT {PROGRESS_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, params![user_id], |row| progress_from_row(row, 0))
        .optional()?
        .ok_or_else(|| ProgressError::UserNotFound(user_id.to_string()).into())
}

fn store_progress(conn: &Connection, user_id: &str, progress: &Progress) -> Result<()> {
    let achievements = serde_json::to_string(&progress.achievements)?;
    let changed = conn.execute(
        "UPDATE users
         SET strength = ?2, stamina = ?3, agility = ?4, points = ?5, xp = ?6, level = ?7,
             achievements = ?8
         WHERE id = ?1",
        params![
            user_id,
            progress.strength,
            progress.stamina,
            progress.agility,
            progress.points,
            progress.xp,
            progress.level,
            achievements,
        ],
    )?;
    if changed == 0 {
        return Err(ProgressError::UserNotFound(user_id.to_string()).into());
    }
    Ok(())
}

/// Reads [`PROGRESS_COLUMNS`] starting at column `offset`.
fn progress_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Progress> {
    let achievements_json: String = row.get(offset + 6)?;
    let achievements: Vec<String> = serde_json::from_str(&achievements_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(offset + 6, Type::Text, Box::new(e))
    })?;
    Ok(Progress {
        strength: row.get(offset)?,
        stamina: row.get(offset + 1)?,
        agility: row.get(offset + 2)?,
        points: row.get(offset + 3)?,
        xp: row.get(offset + 4)?,
        level: row.get(offset + 5)?,
        achievements,
    })
}

fn parse_level(column: usize, raw: &str) -> rusqlite::Result<FitnessLevel> {
    raw.parse::<FitnessLevel>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn profile(email: &str) -> Profile {
        Profile {
            email: email.into(),
            name: "Jinwoo".into(),
            age: 24,
            height_cm: 180.0,
            weight_kg: 70.5,
            activity: "moderate".into(),
        }
    }

    fn db_with_user() -> (Database, String) {
        let db = Database::open_memory().unwrap();
        let id = "user-1".to_string();
        assert!(db
            .insert_user(&id, &profile("jinwoo@hunters.kr"), "salt", "digest", Utc::now())
            .unwrap());
        (db, id)
    }

    fn titles() -> Vec<String> {
        vec!["10 Push-ups".into(), "15 Sit-ups".into()]
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 7, 30, 0).unwrap()
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "value").unwrap();
        assert_eq!(db.kv_get("test").unwrap().as_deref(), Some("value"));
        db.kv_set("test", "other").unwrap();
        assert_eq!(db.kv_get("test").unwrap().as_deref(), Some("other"));
    }

    #[test]
    fn duplicate_email_is_refused() {
        let (db, _) = db_with_user();
        let inserted = db
            .insert_user("user-2", &profile("jinwoo@hunters.kr"), "s", "d", Utc::now())
            .unwrap();
        assert!(!inserted);
    }

    #[test]
    fn new_user_starts_with_default_progress() {
        let (db, id) = db_with_user();
        assert_eq!(db.progress(&id).unwrap(), Progress::default());
        let user = db.user(&id).unwrap().unwrap();
        assert_eq!(user.name, "Jinwoo");
        assert!(user.reevaluation.is_none());
    }

    #[test]
    fn progress_roundtrips_achievements() {
        let (db, id) = db_with_user();
        let progress = Progress {
            points: 3,
            level: 5,
            achievements: vec!["Level 5 Master".into()],
            ..Progress::default()
        };
        db.save_progress(&id, &progress).unwrap();
        assert_eq!(db.progress(&id).unwrap(), progress);
    }

    #[test]
    fn missing_user_progress_is_an_error() {
        let db = Database::open_memory().unwrap();
        let err = db.progress("ghost").unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Progress(ProgressError::UserNotFound(_))
        ));
    }

    #[test]
    fn second_batch_for_same_day_is_refused() {
        let (db, id) = db_with_user();
        let date = start().date_naive();
        let first = db.create_batch(&id, date, start(), &titles()).unwrap();
        assert!(first.is_some());
        let second = db
            .create_batch(&id, date, start() + Duration::minutes(5), &titles())
            .unwrap();
        assert!(second.is_none());
        assert_eq!(db.quests_on(&id, date).unwrap().len(), 2);
    }

    #[test]
    fn batch_items_share_start_time() {
        let (db, id) = db_with_user();
        let date = start().date_naive();
        db.create_batch(&id, date, start(), &titles()).unwrap();
        let day = db.day_batch(&id, date).unwrap().unwrap();
        assert_eq!(day.batch.start_time, start());
        assert!(day.quests.iter().all(|q| q.batch_id == day.batch.id));
        assert_eq!(day.quests[0].title, "10 Push-ups");
    }

    #[test]
    fn completing_awards_a_point_once() {
        let (db, id) = db_with_user();
        let date = start().date_naive();
        let day = db.create_batch(&id, date, start(), &titles()).unwrap().unwrap();
        let quest_id = &day.quests[0].id;

        let (quest, progress) = db.complete_quest(&id, quest_id).unwrap();
        assert!(quest.completed);
        assert_eq!(progress.points, 1);

        let err = db.complete_quest(&id, quest_id).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Quest(QuestError::AlreadyCompleted(_))
        ));
        assert_eq!(db.progress(&id).unwrap().points, 1);
    }

    #[test]
    fn cannot_complete_someone_elses_quest() {
        let (db, id) = db_with_user();
        db.insert_user("user-2", &profile("cha@hunters.kr"), "s", "d", Utc::now())
            .unwrap();
        let day = db
            .create_batch(&id, start().date_naive(), start(), &titles())
            .unwrap()
            .unwrap();
        let err = db.complete_quest("user-2", &day.quests[0].id).unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Quest(QuestError::NotFound(_))));
    }

    #[test]
    fn penalty_is_applied_once() {
        let (db, id) = db_with_user();
        db.save_progress(
            &id,
            &Progress {
                xp: 25,
                points: 2,
                ..Progress::default()
            },
        )
        .unwrap();
        let day = db
            .create_batch(&id, start().date_naive(), start(), &titles())
            .unwrap()
            .unwrap();

        let progress = db.penalize_batch(&id, &day.batch.id).unwrap().unwrap();
        assert_eq!((progress.xp, progress.points), (15, 1));
        assert!(db.penalize_batch(&id, &day.batch.id).unwrap().is_none());
        assert_eq!(db.progress(&id).unwrap().xp, 15);

        let day = db.day_batch(&id, start().date_naive()).unwrap().unwrap();
        assert!(day.batch.penalized);
    }

    #[test]
    fn fully_completed_batch_is_never_penalized() {
        let (db, id) = db_with_user();
        let day = db
            .create_batch(&id, start().date_naive(), start(), &titles())
            .unwrap()
            .unwrap();
        for q in &day.quests {
            db.complete_quest(&id, &q.id).unwrap();
        }
        assert!(db.penalize_batch(&id, &day.batch.id).unwrap().is_none());
        assert_eq!(db.progress(&id).unwrap().points, 2);
    }

    #[test]
    fn evaluations_newest_first() {
        let (db, id) = db_with_user();
        let m = |h| Measurement {
            height_cm: h,
            weight_kg: 70.0,
        };
        db.record_evaluation(&id, &m(170.0), start()).unwrap();
        db.record_evaluation(&id, &m(171.0), start() + Duration::days(1))
            .unwrap();
        let list = db.evaluations(&id).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].height_cm, 171.0);
    }

    #[test]
    fn reevaluation_is_stored_on_user() {
        let (db, id) = db_with_user();
        let re = ReEvaluation {
            strength_level: FitnessLevel::High,
            endurance_level: FitnessLevel::Low,
            completed_at: start(),
        };
        db.save_reevaluation(&id, &re).unwrap();
        let user = db.user(&id).unwrap().unwrap();
        assert_eq!(user.reevaluation, Some(re));
    }
}
