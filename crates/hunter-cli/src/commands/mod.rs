pub mod config;
pub mod date;
pub mod evaluate;
pub mod quest;
pub mod stats;
pub mod user;

use std::io::Write;

use hunter_core::clock::{Clock, SystemClock};
use hunter_core::cue::{Announcer, Cue, CueError, CuePlayer, SilentPlayer};
use hunter_core::{Config, Database, Event, Session};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: store, config and the persisted session.
pub struct Context {
    pub db: Database,
    pub config: Config,
    pub session: Session,
    pub json: bool,
}

impl Context {
    pub fn open(json: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open()?;
        let config = Config::load_or_default();
        let session = Session::load(&db, SystemClock.today())?;
        Ok(Self {
            json: json || config.ui.json_output,
            db,
            config,
            session,
        })
    }

    pub fn save_session(&self) -> CmdResult {
        self.session.save(&self.db)?;
        Ok(())
    }

    /// Print `value` as pretty JSON, or `text()` otherwise.
    pub fn print<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> CmdResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    /// Render events and play their cues.
    pub fn emit<P: CuePlayer>(&self, announcer: &mut Announcer<P>, events: &[Event]) -> CmdResult {
        for event in events {
            self.emit_one(event)?;
            if let Some(prompt) = announcer.announce(event) {
                self.emit_one(&prompt)?;
            }
        }
        Ok(())
    }

    fn emit_one(&self, event: &Event) -> CmdResult {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("» {}", event.message());
        }
        Ok(())
    }

    pub fn announcer(&self) -> Announcer<Speaker> {
        let notifications = &self.config.notifications;
        let speaker = if notifications.enabled && notifications.sound {
            Speaker::Bell
        } else {
            Speaker::Silent(SilentPlayer)
        };
        Announcer::new(speaker)
    }
}

/// Cue output for the terminal.
pub enum Speaker {
    Bell,
    Silent(SilentPlayer),
}

impl CuePlayer for Speaker {
    fn play(&mut self, cue: Cue) -> Result<(), CueError> {
        match self {
            Speaker::Bell => {
                let mut err = std::io::stderr();
                let bells: &[u8] = match cue {
                    Cue::Complete => b"\x07",
                    Cue::Warning => b"\x07\x07",
                };
                err.write_all(bells)
                    .and_then(|_| err.flush())
                    .map_err(|e| CueError::Blocked(e.to_string()))
            }
            Speaker::Silent(player) => player.play(cue),
        }
    }
}
