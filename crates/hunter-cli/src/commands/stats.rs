use chrono::Utc;
use clap::Subcommand;
use hunter_core::account;
use hunter_core::progress::{self, Progress, Stat};

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Stats, points, XP and achievements
    Show,
    /// Spend one point on a stat
    Upgrade {
        /// strength, stamina or agility
        stat: Stat,
    },
    /// Time-of-day greeting
    Greet,
}

fn render(progress: &Progress) -> String {
    let filled = (progress.xp_progress_pct() / 5) as usize;
    let mut text = format!(
        "Level {}  [{}{}] {} XP\nPoints: {}\n",
        progress.level,
        "#".repeat(filled),
        "-".repeat(20 - filled),
        progress.xp,
        progress.points,
    );
    for stat in Stat::ALL {
        text.push_str(&format!("{:<9} {}\n", stat.label(), progress.stat(stat)));
    }
    if progress.achievements.is_empty() {
        text.push_str("Achievements: none");
    } else {
        text.push_str(&format!("Achievements: {}", progress.achievements.join(", ")));
    }
    text
}

pub fn run(action: StatsAction, json: bool) -> CmdResult {
    let ctx = Context::open(json)?;
    let owner = ctx.session.require_user()?;

    match action {
        StatsAction::Show => {
            let progress = ctx.db.progress(owner)?;
            ctx.print(&progress, || render(&progress))?;
        }
        StatsAction::Upgrade { stat } => {
            let (_, events) = progress::upgrade_stat(&ctx.db, owner, stat, Utc::now())?;
            let mut announcer = ctx.announcer();
            ctx.emit(&mut announcer, &events)?;
        }
        StatsAction::Greet => {
            let user = ctx.db.user(owner)?;
            let line = account::greeting_at(
                user.as_ref().map(|u| u.name.as_str()),
                user.as_ref().map(|u| u.email.as_str()),
                Utc::now(),
            );
            ctx.print(&serde_json::json!({ "greeting": line }), || line.clone())?;
        }
    }
    Ok(())
}

pub fn leaderboard(json: bool) -> CmdResult {
    let ctx = Context::open(json)?;
    let standings = progress::leaderboard(&ctx.db)?;
    ctx.print(&standings, || {
        if standings.is_empty() {
            return "No hunters yet.".to_string();
        }
        standings
            .iter()
            .map(|s| format!("{:>3}. {:<20} Lv {:<3} {} XP", s.rank, s.name, s.level, s.xp))
            .collect::<Vec<_>>()
            .join("\n")
    })
}
