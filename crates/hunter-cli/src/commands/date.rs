use chrono::NaiveDate;
use clap::Subcommand;
use hunter_core::clock::{Clock, SystemClock};

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum DateAction {
    /// Print the selected date
    Show,
    /// Select the previous day
    Prev,
    /// Select the next day (never past today)
    Next,
    /// Select a specific date
    Set {
        /// YYYY-MM-DD
        date: NaiveDate,
    },
    /// Jump back to today
    Today,
}

pub fn run(action: DateAction, json: bool) -> CmdResult {
    let mut ctx = Context::open(json)?;
    let today = SystemClock.today();

    match action {
        DateAction::Show => {}
        DateAction::Prev => {
            ctx.session.prev_day();
        }
        DateAction::Next => {
            if !ctx.session.next_day(today) {
                eprintln!("already at today");
            }
        }
        DateAction::Set { date } => ctx.session.select_date(date, today)?,
        DateAction::Today => ctx.session.selected_date = today,
    }

    ctx.save_session()?;
    let selected = ctx.session.selected_date;
    ctx.print(&serde_json::json!({ "selected_date": selected, "today": today }), || {
        if selected == today {
            format!("{selected} (today)")
        } else {
            selected.to_string()
        }
    })
}
