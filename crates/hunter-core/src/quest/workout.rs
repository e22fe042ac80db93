//! Level-indexed daily workout table.

use serde::{Deserialize, Serialize};

/// Repetition counts for one day's routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    pub pushups: u32,
    pub situps: u32,
    pub squats: u32,
    pub jumping_jacks: u32,
}

const BEGINNER: Workout = Workout {
    pushups: 10,
    situps: 15,
    squats: 20,
    jumping_jacks: 30,
};

const ADVANCED: Workout = Workout {
    pushups: 15,
    situps: 20,
    squats: 25,
    jumping_jacks: 40,
};

impl Workout {
    /// Only levels 1 and 5 have their own entry; every other level uses the
    /// level-1 routine.
    pub fn for_level(level: u32) -> Self {
        match level {
            5 => ADVANCED,
            _ => BEGINNER,
        }
    }

    /// The four quest titles of the routine, in display order.
    pub fn titles(&self) -> Vec<String> {
        vec![
            format!("{} Push-ups", self.pushups),
            format!("{} Sit-ups", self.situps),
            format!("{} Squats", self.squats),
            format!("{} Jumping Jacks", self.jumping_jacks),
        ]
    }
}
