//! Keyword command language
//!
//! Players write free-form "code" in any style. Only keywords matter: each
//! line yields at most one action, and a handful of patterns are rejected
//! before anything reaches the simulation.

pub mod error;
pub mod parser;

use serde::{Deserialize, Serialize};

pub use error::InvalidCode;
pub use parser::parse_program;

/// Lateral direction of a lane change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneDir {
    Left,
    Right,
}

impl LaneDir {
    /// Signed lane index delta
    pub fn delta(self) -> isize {
        match self {
            LaneDir::Left => -1,
            LaneDir::Right => 1,
        }
    }
}

/// One parsed instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Lane(LaneDir),
    Attack,
    Boost,
    Brake,
}

impl Action {
    /// Short label shown in the HUD
    pub fn label(&self) -> &'static str {
        match self {
            Action::Lane(LaneDir::Left) => "Left",
            Action::Lane(LaneDir::Right) => "Right",
            Action::Attack => "Attack",
            Action::Boost => "Boost",
            Action::Brake => "Brake",
        }
    }
}

/// A validated program: speed override plus the action loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Speed multiplier, already clamped to `[SPEED_MIN, SPEED_MAX]`
    pub speed: f32,
    /// Actions applied cyclically; may be empty (the car just cruises)
    pub actions: Vec<Action>,
}

impl Program {
    /// Action applied at a given command index (wraps around)
    pub fn action_at(&self, index: usize) -> Option<Action> {
        if self.actions.is_empty() {
            None
        } else {
            Some(self.actions[index % self.actions.len()])
        }
    }
}

impl Default for Program {
    fn default() -> Self {
        Self {
            speed: crate::consts::DEFAULT_SPEED,
            actions: Vec::new(),
        }
    }
}
