//! Data-driven game balance
//!
//! Every gameplay constant the engine and state machine use. Geometry that
//! the renderer relies on stays in `consts`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Gameplay tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Command cadence ===
    /// Simulated seconds between two applied actions
    pub command_interval: f32,

    // === Attack ===
    pub attack_cooldown: f32,
    /// Pulse ring lifetime after an attack
    pub pulse_duration: f32,
    /// Max distance from player to the nearest target for a hit
    pub attack_radius: f32,

    // === Speed modifiers ===
    pub boost_step: f32,
    pub boost_min: f32,
    pub boost_max: f32,
    pub brake_step: f32,
    pub brake_min: f32,
    pub brake_max: f32,
    /// Exponential relaxation rate of the speed modifier toward 1
    pub speed_mod_relax_rate: f32,

    // === Motion ===
    /// Lateral interpolation rate toward the target lane
    pub lane_lerp_rate: f32,
    pub base_road_speed: f32,
    pub road_speed_per_level: f32,
    /// Targets scroll slightly faster than the road
    pub target_scroll_mul: f32,

    // === Traffic ===
    pub traffic_hit_cooldown: f32,
    pub traffic_hit_half_width: f32,
    pub traffic_hit_half_depth: f32,
    /// Cars closer than this (in z) are pushed ahead after a non-fatal hit
    pub breathing_room: f32,

    // === Scoring ===
    pub points_correct: u32,
    pub penalty_wrong: u32,
    pub points_per_level: u32,
    pub max_lives: u8,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            command_interval: 0.42,

            attack_cooldown: 0.55,
            pulse_duration: 0.28,
            attack_radius: 1.55,

            boost_step: 0.23,
            boost_min: 1.0,
            boost_max: 1.65,
            brake_step: 0.25,
            brake_min: 0.65,
            brake_max: 1.2,
            speed_mod_relax_rate: 2.8,

            lane_lerp_rate: 10.0,
            base_road_speed: 2.8,
            road_speed_per_level: 0.18,
            target_scroll_mul: 1.15,

            traffic_hit_cooldown: 1.0,
            traffic_hit_half_width: 0.7,
            traffic_hit_half_depth: 0.85,
            breathing_room: 6.0,

            points_correct: 5,
            penalty_wrong: 2,
            points_per_level: 25,
            max_lives: 3,
        }
    }
}

#[derive(Debug)]
pub enum TuningError {
    Parse(serde_json::Error),
    Io(std::io::Error),
    NotPositive { field: &'static str },
    InvertedRange { field: &'static str },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "tuning JSON is malformed: {e}"),
            Self::Io(e) => write!(f, "failed to read tuning file: {e}"),
            Self::NotPositive { field } => write!(f, "tuning `{field}` must be positive"),
            Self::InvertedRange { field } => write!(f, "tuning `{field}` range is inverted"),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json).map_err(TuningError::Parse)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: &std::path::Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path).map_err(TuningError::Io)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("command_interval", self.command_interval),
            ("attack_radius", self.attack_radius),
            ("base_road_speed", self.base_road_speed),
            ("traffic_hit_half_width", self.traffic_hit_half_width),
            ("traffic_hit_half_depth", self.traffic_hit_half_depth),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(TuningError::NotPositive { field });
            }
        }
        if self.max_lives == 0 {
            return Err(TuningError::NotPositive { field: "max_lives" });
        }
        if self.points_per_level == 0 {
            return Err(TuningError::NotPositive {
                field: "points_per_level",
            });
        }
        if self.boost_min > self.boost_max {
            return Err(TuningError::InvertedRange { field: "boost" });
        }
        if self.brake_min > self.brake_max {
            return Err(TuningError::InvertedRange { field: "brake" });
        }
        Ok(())
    }

    /// Level reached at a given score. A zero `points_per_level` never
    /// levels up.
    pub fn level_for_score(&self, score: u32) -> u32 {
        1 + score.checked_div(self.points_per_level).unwrap_or(0)
    }

    /// Road speed before `dt` is applied
    pub fn road_speed(&self, level: u32, program_speed: f32, speed_mod: f32) -> f32 {
        use crate::consts::{SPEED_MAX, SPEED_MIN};
        (self.base_road_speed + level as f32 * self.road_speed_per_level)
            * program_speed.clamp(SPEED_MIN, SPEED_MAX)
            * speed_mod
    }
}
