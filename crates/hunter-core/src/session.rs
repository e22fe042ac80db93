//! Session context shared by every screen.
//!
//! Holds the signed-in user and the selected calendar date. Screens take it
//! by reference; it is persisted in the kv table between CLI invocations.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{QuestError, Result, ValidationError};
use crate::storage::Database;

const SESSION_KEY: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user_id: Option<String>,
    pub selected_date: NaiveDate,
}

impl Session {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            user_id: None,
            selected_date: today,
        }
    }

    /// # Errors
    /// Returns [`QuestError::NotSignedIn`] when nobody is logged in.
    pub fn require_user(&self) -> Result<&str, QuestError> {
        self.user_id.as_deref().ok_or(QuestError::NotSignedIn)
    }

    pub fn sign_in(&mut self, user_id: impl Into<String>, today: NaiveDate) {
        self.user_id = Some(user_id.into());
        self.selected_date = today;
    }

    pub fn sign_out(&mut self) {
        self.user_id = None;
    }

    pub fn prev_day(&mut self) -> NaiveDate {
        self.selected_date = self.selected_date - Duration::days(1);
        self.selected_date
    }

    /// Move forward one day. Returns `false` (and stays put) when the
    /// selected date is already today.
    pub fn next_day(&mut self, today: NaiveDate) -> bool {
        if self.selected_date >= today {
            return false;
        }
        self.selected_date = self.selected_date + Duration::days(1);
        true
    }

    /// # Errors
    /// Future dates are rejected.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
        if date > today {
            return Err(ValidationError::InvalidValue {
                field: "date".into(),
                message: format!("{date} is in the future"),
            });
        }
        self.selected_date = date;
        Ok(())
    }

    /// Restore the stored session, or a fresh one for `today`.
    pub fn load(db: &Database, today: NaiveDate) -> Result<Self> {
        match db.kv_get(SESSION_KEY)? {
            Some(json) => match serde_json::from_str::<Session>(&json) {
                Ok(session) => Ok(session),
                Err(e) => {
                    tracing::warn!("discarding unreadable session: {e}");
                    Ok(Self::new(today))
                }
            },
            None => Ok(Self::new(today)),
        }
    }

    pub fn save(&self, db: &Database) -> Result<()> {
        db.kv_set(SESSION_KEY, &serde_json::to_string(self)?)?;
        Ok(())
    }
}
