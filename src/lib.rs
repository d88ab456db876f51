//! Code Racer - a lane-racing quiz game driven by a tiny command language
//!
//! Core modules:
//! - `script`: Keyword command language (parser/validator)
//! - `bank`: Question bank contract and the built-in JSON bank
//! - `round`: Round generator (question + three lane-tagged answers)
//! - `sim`: Deterministic simulation (lanes, traffic, targets, attacks)
//! - `game`: Game state machine (score, streak, lives, level, crash)
//! - `tuning`: Data-driven game balance

pub mod bank;
pub mod game;
pub mod round;
pub mod script;
pub mod sim;
pub mod tuning;

pub use bank::{BankError, BuiltinBank, Question, QuestionBank};
pub use game::{CrashReason, Game, GameError, GamePhase, GameState, Hud, Rank};
pub use round::{AnswerOption, Round, RoundGenerator};
pub use script::{Action, InvalidCode, LaneDir, Program, parse_program};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Number of lanes on the road
    pub const LANE_COUNT: usize = 3;
    /// Lateral x position of each lane center (left, center, right)
    pub const LANE_X: [f32; LANE_COUNT] = [-2.0, 0.0, 2.0];
    /// Lane the player starts in
    pub const START_LANE: usize = 1;
    /// Player sits at a fixed depth; the world scrolls past
    pub const PLAYER_Z: f32 = -2.0;

    /// Program limits
    pub const MAX_PROGRAM_CHARS: usize = 5000;
    pub const MAX_ACTIONS: usize = 300;

    /// Speed override bounds and default
    pub const SPEED_MIN: f32 = 0.6;
    pub const SPEED_MAX: f32 = 2.4;
    pub const DEFAULT_SPEED: f32 = 1.1;

    /// Traffic arena size (fixed slots, recycled in place)
    pub const TRAFFIC_SLOTS: usize = 4;
    /// Cars behind this depth are recycled ahead
    pub const TRAFFIC_REAR_Z: f32 = -9.0;
    /// Recycled cars re-enter at `TRAFFIC_SPAWN_Z + rand(0, TRAFFIC_SPAWN_JITTER)`
    pub const TRAFFIC_SPAWN_Z: f32 = 9.0;
    pub const TRAFFIC_SPAWN_JITTER: f32 = 7.0;
    /// Traffic speed multiplier range
    pub const TRAFFIC_SPEED_MUL_MIN: f32 = 0.8;
    pub const TRAFFIC_SPEED_MUL_MAX: f32 = 1.6;
    /// Lateral sway amplitude and rate
    pub const TRAFFIC_DRIFT_AMPLITUDE: f32 = 0.12;
    pub const TRAFFIC_DRIFT_RATE: f32 = 1.7;

    /// Targets behind this depth are recycled ahead
    pub const TARGET_REAR_Z: f32 = -6.0;
    pub const TARGET_SPAWN_Z: f32 = 10.0;
    pub const TARGET_SPAWN_JITTER: f32 = 6.0;
    /// Spin rate of target stars (radians/sec)
    pub const TARGET_SPIN_RATE: f32 = 2.4;

    /// Distance between dashed road stripes
    pub const STRIPE_SPACING: f32 = 2.5;
}

/// Lateral x coordinate of a lane index (clamped to the road)
#[inline]
pub fn lane_x(lane: usize) -> f32 {
    consts::LANE_X[lane.min(consts::LANE_COUNT - 1)]
}
