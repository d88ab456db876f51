//! Deterministic simulation module
//!
//! All per-frame gameplay lives here. This module must be pure and deterministic:
//! - Caller-supplied `dt` only
//! - Seeded RNG only
//! - Fixed-slot entities, stable iteration order
//! - No rendering or platform dependencies

pub mod pool;
pub mod snapshot;
pub mod state;
pub mod step;

pub use pool::EntityPool;
pub use snapshot::{Frame, PulseView, TargetView, TrafficView};
pub use state::{Player, RuntimeState, Simulation, Target, TrafficCar};
pub use step::{SimEvent, StepInput, step};
