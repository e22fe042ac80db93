//! Hunter progress: stats, points, XP and levels.
//!
//! Points are earned by completing quests and spent on stat upgrades.
//! Each upgrade grants XP; every [`XP_PER_LEVEL`] XP rolls over into a level.

mod leaderboard;

pub use leaderboard::{rank, Standing, StandingRow};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProgressError, Result};
use crate::events::Event;
use crate::storage::Database;

pub const XP_PER_LEVEL: u32 = 100;
/// XP granted per stat upgrade.
pub const UPGRADE_XP: u32 = 10;
pub const PENALTY_XP: u32 = 10;
pub const PENALTY_POINTS: u32 = 1;

pub const LEVEL_5_MASTER: &str = "Level 5 Master";
pub const XP_CHAMPION: &str = "XP Champion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Strength,
    Stamina,
    Agility,
}

impl Stat {
    pub const ALL: [Stat; 3] = [Stat::Strength, Stat::Stamina, Stat::Agility];

    pub fn label(self) -> &'static str {
        match self {
            Stat::Strength => "Strength",
            Stat::Stamina => "Stamina",
            Stat::Agility => "Agility",
        }
    }
}

impl std::str::FromStr for Stat {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strength" | "str" => Ok(Stat::Strength),
            "stamina" | "sta" => Ok(Stat::Stamina),
            "agility" | "agi" => Ok(Stat::Agility),
            other => Err(ProgressError::UnknownStat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub strength: u32,
    pub stamina: u32,
    pub agility: u32,
    pub points: u32,
    pub xp: u32,
    pub level: u32,
    #[serde(default)]
    pub achievements: Vec<String>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            strength: 0,
            stamina: 0,
            agility: 0,
            points: 0,
            xp: 0,
            level: 1,
            achievements: Vec::new(),
        }
    }
}

/// Outcome of a single stat upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrade {
    pub stat: Stat,
    pub value: u32,
    pub leveled_up: bool,
    pub new_achievements: Vec<String>,
}

impl Progress {
    pub fn stat(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Strength => self.strength,
            Stat::Stamina => self.stamina,
            Stat::Agility => self.agility,
        }
    }

    fn stat_mut(&mut self, stat: Stat) -> &mut u32 {
        match stat {
            Stat::Strength => &mut self.strength,
            Stat::Stamina => &mut self.stamina,
            Stat::Agility => &mut self.agility,
        }
    }

    /// 0..=100 fill of the XP bar.
    pub fn xp_progress_pct(&self) -> u32 {
        self.xp.min(XP_PER_LEVEL) * 100 / XP_PER_LEVEL
    }

    pub fn award_completion(&mut self) {
        self.points += 1;
    }

    /// Deadline penalty. Both values floor at zero.
    pub fn apply_penalty(&mut self) {
        self.xp = self.xp.saturating_sub(PENALTY_XP);
        self.points = self.points.saturating_sub(PENALTY_POINTS);
    }

    /// Spend one point on `stat`.
    ///
    /// # Errors
    /// Returns [`ProgressError::NoPoints`] when no points are available;
    /// progress is left untouched in that case.
    pub fn upgrade(&mut self, stat: Stat) -> Result<Upgrade, ProgressError> {
        if self.points == 0 {
            return Err(ProgressError::NoPoints);
        }

        *self.stat_mut(stat) += 1;
        self.points -= 1;
        self.xp += UPGRADE_XP;

        let mut leveled_up = false;
        while self.xp >= XP_PER_LEVEL {
            self.xp -= XP_PER_LEVEL;
            self.level += 1;
            leveled_up = true;
        }

        let new_achievements = if leveled_up {
            self.check_achievements()
        } else {
            Vec::new()
        };

        Ok(Upgrade {
            stat,
            value: self.stat(stat),
            leveled_up,
            new_achievements,
        })
    }

    /// Award any badge newly earned. Returns only the ones added now.
    pub fn check_achievements(&mut self) -> Vec<String> {
        let mut earned = Vec::new();
        if self.level == 5 && !self.has_achievement(LEVEL_5_MASTER) {
            earned.push(LEVEL_5_MASTER.to_string());
        }
        if self.xp >= 500 && !self.has_achievement(XP_CHAMPION) {
            earned.push(XP_CHAMPION.to_string());
        }
        self.achievements.extend(earned.iter().cloned());
        earned
    }

    pub fn has_achievement(&self, name: &str) -> bool {
        self.achievements.iter().any(|a| a == name)
    }
}

/// Spend one of the user's points on `stat` and persist the result.
///
/// Emits `StatUpgraded`, then `LevelUp` and `AchievementUnlocked` as earned.
///
/// # Errors
/// [`ProgressError::NoPoints`] leaves the stored progress untouched.
pub fn upgrade_stat(
    db: &Database,
    user_id: &str,
    stat: Stat,
    now: DateTime<Utc>,
) -> Result<(Progress, Vec<Event>)> {
    let mut progress = db.progress(user_id)?;
    let upgrade = progress.upgrade(stat)?;
    db.save_progress(user_id, &progress)?;
    tracing::info!(stat = stat.label(), value = upgrade.value, "stat upgraded");

    let mut events = vec![Event::StatUpgraded {
        stat,
        value: upgrade.value,
        points: progress.points,
        xp: progress.xp,
        at: now,
    }];
    if upgrade.leveled_up {
        events.push(Event::LevelUp {
            level: progress.level,
            at: now,
        });
    }
    events.extend(
        upgrade
            .new_achievements
            .into_iter()
            .map(|name| Event::AchievementUnlocked { name, at: now }),
    );
    Ok((progress, events))
}

/// All users, ranked.
pub fn leaderboard(db: &Database) -> Result<Vec<Standing>> {
    Ok(rank(db.standing_rows()?))
}
