//! Simulation state and entity types
//!
//! Positions use `glam::Vec2` with `x` lateral and `y` as road depth (z).
//! The player sits at a fixed depth; everything else scrolls toward -z.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pool::EntityPool;
use crate::consts::*;
use crate::lane_x;
use crate::round::Round;
use crate::script::Action;

/// Per-run mutable state, wiped on run, reset, round change and level change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeState {
    /// Lane the player is steering toward
    pub lane_index: usize,
    /// Next action to apply (index into the program, wraps)
    pub command_index: usize,
    /// Time accumulated toward the next action
    pub command_elapsed: f32,
    pub attack_cooldown: f32,
    /// Pulse ring lifetime; keeps decaying while stopped
    pub pulse_timer: f32,
    /// Transient boost/brake multiplier, relaxes back to 1
    pub speed_mod: f32,
    pub traffic_hit_cooldown: f32,
    /// Last applied action (HUD label)
    pub last_action: Option<Action>,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            lane_index: START_LANE,
            command_index: 0,
            command_elapsed: 0.0,
            attack_cooldown: 0.0,
            pulse_timer: 0.0,
            speed_mod: 1.0,
            traffic_hit_cooldown: 0.0,
            last_action: None,
        }
    }
}

/// The player's car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Lateral position, eased toward the target lane
    pub x: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            x: lane_x(START_LANE),
        }
    }
}

impl Player {
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, PLAYER_Z)
    }

    /// Ease toward a lateral target without overshooting
    pub fn move_toward(&mut self, target_x: f32, dt: f32, rate: f32) {
        let blend = (rate * dt).clamp(0.0, 1.0);
        self.x += (target_x - self.x) * blend;
    }
}

/// An obstacle car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficCar {
    /// Arena slot id (stable across respawns)
    pub id: u32,
    pub lane: usize,
    pub x: f32,
    pub z: f32,
    pub speed_mul: f32,
    /// Per-car phase offset for lateral sway
    pub drift_seed: f32,
    pub drift_phase: f32,
}

impl TrafficCar {
    pub fn spawn<R: Rng + ?Sized>(id: u32, z: f32, rng: &mut R) -> Self {
        let mut car = Self {
            id,
            lane: 0,
            x: 0.0,
            z,
            speed_mul: 1.0,
            drift_seed: 0.0,
            drift_phase: 0.0,
        };
        car.respawn_at(z, rng);
        car
    }

    /// Re-roll lane, speed and sway, and park the car at depth `z`
    pub fn respawn_at<R: Rng + ?Sized>(&mut self, z: f32, rng: &mut R) {
        self.lane = rng.random_range(0..LANE_COUNT);
        self.speed_mul = rng.random_range(TRAFFIC_SPEED_MUL_MIN..=TRAFFIC_SPEED_MUL_MAX);
        self.drift_seed = rng.random_range(0.0..std::f32::consts::TAU);
        self.drift_phase = 0.0;
        self.z = z;
        self.update_sway();
    }

    /// Recycle ahead of the player with randomized depth
    pub fn respawn_ahead<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let z = TRAFFIC_SPAWN_Z + rng.random_range(0.0..TRAFFIC_SPAWN_JITTER);
        self.respawn_at(z, rng);
    }

    pub fn update_sway(&mut self) {
        self.x = lane_x(self.lane)
            + (self.drift_phase + self.drift_seed).sin() * TRAFFIC_DRIFT_AMPLITUDE;
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

/// An attackable answer star
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    pub option_id: String,
    pub text: String,
    pub is_correct: bool,
    pub lane: usize,
    pub x: f32,
    pub z: f32,
    pub spin: f32,
}

impl Target {
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    pub fn respawn_ahead<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.z = TARGET_SPAWN_Z + rng.random_range(0.0..TARGET_SPAWN_JITTER);
    }
}

/// Everything the engine mutates each step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub runtime: RuntimeState,
    pub player: Player,
    pub pool: EntityPool,
    /// Road stripe scroll offset in `[0, STRIPE_SPACING)`
    pub stripe_offset: f32,
}

impl Simulation {
    pub fn new<R: Rng + ?Sized>(round: &Round, rng: &mut R) -> Self {
        Self {
            runtime: RuntimeState::default(),
            player: Player::default(),
            pool: EntityPool::new(round, rng),
            stripe_offset: 0.0,
        }
    }

    /// Drop all in-flight runtime state (cursor, cooldowns, boosts)
    pub fn reset_runtime(&mut self) {
        self.runtime = RuntimeState::default();
    }

    /// Swap targets to a new round; runtime state starts over
    pub fn load_round<R: Rng + ?Sized>(&mut self, round: &Round, rng: &mut R) {
        self.pool.load_round(round, rng);
        self.reset_runtime();
    }
}
