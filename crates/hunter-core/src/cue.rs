//! Audible cues for quest events.
//!
//! Playback may be refused by the platform. The [`Announcer`] swallows such
//! failures and asks the user, once, to interact so sound can be unlocked.

use chrono::Utc;
use thiserror::Error;

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Quest completed or rest over.
    Complete,
    /// Countdown turned urgent.
    Warning,
}

impl Cue {
    pub fn for_event(event: &Event) -> Option<Cue> {
        match event {
            Event::QuestCompleted { .. } | Event::RestFinished { .. } => Some(Cue::Complete),
            Event::CountdownUrgent { .. } | Event::PenaltyApplied { .. } => Some(Cue::Warning),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CueError {
    #[error("playback blocked: {0}")]
    Blocked(String),
    #[error("no audio output available")]
    Unavailable,
}

pub trait CuePlayer {
    fn play(&mut self, cue: Cue) -> Result<(), CueError>;
}

/// Plays nothing. Used when notifications are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play(&mut self, _cue: Cue) -> Result<(), CueError> {
        Ok(())
    }
}

pub struct Announcer<P: CuePlayer> {
    player: P,
    prompted: bool,
}

impl<P: CuePlayer> Announcer<P> {
    pub fn new(player: P) -> Self {
        Self {
            player,
            prompted: false,
        }
    }

    /// Play the cue for `event`, if any. Returns an
    /// [`Event::AudioBlocked`] prompt the first time playback fails.
    pub fn announce(&mut self, event: &Event) -> Option<Event> {
        let cue = Cue::for_event(event)?;
        match self.player.play(cue) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(?cue, "cue playback failed: {e}");
                if self.prompted {
                    None
                } else {
                    self.prompted = true;
                    Some(Event::AudioBlocked { at: Utc::now() })
                }
            }
        }
    }

    /// The user interacted; allow a fresh prompt on the next failure.
    pub fn unlock(&mut self) {
        self.prompted = false;
    }

    pub fn player(&self) -> &P {
        &self.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        played: Vec<Cue>,
        blocked: bool,
    }

    impl CuePlayer for Recorder {
        fn play(&mut self, cue: Cue) -> Result<(), CueError> {
            if self.blocked {
                return Err(CueError::Blocked("autoplay policy".into()));
            }
            self.played.push(cue);
            Ok(())
        }
    }

    fn completed() -> Event {
        Event::QuestCompleted {
            quest_id: "q".into(),
            title: "10 Push-ups".into(),
            points: 1,
            at: Utc::now(),
        }
    }

    #[test]
    fn maps_events_to_cues() {
        let mut announcer = Announcer::new(Recorder::default());
        announcer.announce(&completed());
        announcer.announce(&Event::CountdownUrgent {
            remaining_ms: 1000,
            threshold_ms: 300_000,
            at: Utc::now(),
        });
        announcer.announce(&Event::CountdownCleared { at: Utc::now() });
        assert_eq!(announcer.player().played, vec![Cue::Complete, Cue::Warning]);
    }

    #[test]
    fn blocked_playback_prompts_once() {
        let mut announcer = Announcer::new(Recorder {
            blocked: true,
            ..Recorder::default()
        });
        assert!(matches!(
            announcer.announce(&completed()),
            Some(Event::AudioBlocked { .. })
        ));
        assert!(announcer.announce(&completed()).is_none());

        announcer.unlock();
        assert!(announcer.announce(&completed()).is_some());
    }
}
