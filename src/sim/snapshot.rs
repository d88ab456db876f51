//! Read-only per-frame view for renderers
//!
//! Borrowed from the simulation; a renderer can draw or serialize it but
//! never mutate engine state through it.

use glam::Vec2;
use serde::Serialize;

use super::state::Simulation;
use crate::consts::{LANE_COUNT, TRAFFIC_SLOTS};

/// Extra ring scale reached at the end of the pulse
const PULSE_GROWTH: f32 = 0.8;
const PULSE_MAX_OPACITY: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficView {
    pub id: u32,
    pub x: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetView<'a> {
    pub id: u32,
    pub x: f32,
    pub z: f32,
    pub spin: f32,
    pub is_correct: bool,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PulseView {
    pub visible: bool,
    pub opacity: f32,
    pub scale: f32,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame<'a> {
    /// `x` lateral, `y` road depth
    pub player: Vec2,
    pub traffic: [TrafficView; TRAFFIC_SLOTS],
    pub targets: [TargetView<'a>; LANE_COUNT],
    pub pulse: PulseView,
    pub stripe_offset: f32,
}

impl Simulation {
    /// Snapshot for the renderer. `pulse_duration` sizes the ring animation.
    pub fn frame(&self, pulse_duration: f32) -> Frame<'_> {
        let traffic = std::array::from_fn(|i| {
            let car = &self.pool.traffic[i];
            TrafficView {
                id: car.id,
                x: car.x,
                z: car.z,
            }
        });
        let targets = std::array::from_fn(|i| {
            let t = &self.pool.targets[i];
            TargetView {
                id: t.id,
                x: t.x,
                z: t.z,
                spin: t.spin,
                is_correct: t.is_correct,
                text: &t.text,
            }
        });

        let timer = self.runtime.pulse_timer;
        let progress = if pulse_duration > 0.0 {
            1.0 - (timer / pulse_duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let pulse = PulseView {
            visible: timer > 0.0,
            opacity: (timer * 2.0).clamp(0.0, PULSE_MAX_OPACITY),
            scale: 1.0 + progress * PULSE_GROWTH,
        };

        Frame {
            player: self.player.pos(),
            traffic,
            targets,
            pulse,
            stripe_offset: self.stripe_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::BuiltinBank;
    use crate::round::RoundGenerator;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn sim() -> Simulation {
        let bank = BuiltinBank::load().unwrap();
        let mut rng = Pcg32::seed_from_u64(11);
        let round = RoundGenerator::new(&bank, "rust")
            .unwrap()
            .next_round(None, &mut rng);
        Simulation::new(&round, &mut rng)
    }

    #[test]
    fn test_frame_mirrors_entities() {
        let sim = sim();
        let frame = sim.frame(0.28);
        for (view, car) in frame.traffic.iter().zip(&sim.pool.traffic) {
            assert_eq!((view.id, view.x, view.z), (car.id, car.x, car.z));
        }
        assert_eq!(frame.targets.iter().filter(|t| t.is_correct).count(), 1);
        assert!(!frame.pulse.visible);
    }

    #[test]
    fn test_pulse_ring_grows_and_fades() {
        let mut sim = sim();
        sim.runtime.pulse_timer = 0.28;
        let fresh = sim.frame(0.28).pulse;
        assert!(fresh.visible);
        assert_eq!(fresh.scale, 1.0);
        assert!(fresh.opacity > 0.5 && fresh.opacity <= PULSE_MAX_OPACITY);

        sim.runtime.pulse_timer = 0.07;
        let late = sim.frame(0.28).pulse;
        assert!(late.scale > fresh.scale);
        assert!(late.opacity < fresh.opacity);
    }

    #[test]
    fn test_frame_serializes() {
        let sim = sim();
        let json = serde_json::to_string(&sim.frame(0.28)).unwrap();
        assert!(json.contains("\"traffic\""));
        assert!(json.contains("\"stripe_offset\""));
    }
}
