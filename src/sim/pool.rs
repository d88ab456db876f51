//! Fixed-slot entity arena
//!
//! Traffic and targets are created once and recycled in place; nothing is
//! allocated or freed per tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Target, TrafficCar};
use crate::consts::*;
use crate::lane_x;
use crate::round::Round;

/// Initial spacing between traffic slots so cars don't arrive in a clump
const TRAFFIC_INITIAL_GAP: f32 = 3.5;
/// Targets of a fresh round start closer than recycled ones
const TARGET_INITIAL_Z: f32 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPool {
    pub traffic: [TrafficCar; TRAFFIC_SLOTS],
    /// One star per answer option, indexed by lane
    pub targets: [Target; LANE_COUNT],
}

impl EntityPool {
    pub fn new<R: Rng + ?Sized>(round: &Round, rng: &mut R) -> Self {
        let traffic = std::array::from_fn(|slot| {
            let z = TRAFFIC_SPAWN_Z
                + slot as f32 * TRAFFIC_INITIAL_GAP
                + rng.random_range(0.0..TRAFFIC_SPAWN_JITTER);
            TrafficCar::spawn(slot as u32 + 1, z, rng)
        });
        let targets = Self::targets_for(round, rng);
        Self { traffic, targets }
    }

    /// Replace the stars with the options of `round`
    pub fn load_round<R: Rng + ?Sized>(&mut self, round: &Round, rng: &mut R) {
        self.targets = Self::targets_for(round, rng);
    }

    fn targets_for<R: Rng + ?Sized>(round: &Round, rng: &mut R) -> [Target; LANE_COUNT] {
        std::array::from_fn(|slot| {
            let option = &round.options[slot];
            Target {
                id: slot as u32 + 1,
                option_id: option.id.clone(),
                text: option.text.clone(),
                is_correct: option.is_correct,
                lane: option.lane,
                x: lane_x(option.lane),
                z: TARGET_INITIAL_Z + rng.random_range(0.0..TARGET_SPAWN_JITTER),
                spin: 0.0,
            }
        })
    }

    /// Scroll every entity toward the player by `frame_move`
    pub fn scroll<R: Rng + ?Sized>(
        &mut self,
        frame_move: f32,
        dt: f32,
        target_scroll_mul: f32,
        rng: &mut R,
    ) {
        for car in &mut self.traffic {
            car.z -= frame_move * car.speed_mul;
            car.drift_phase += dt * TRAFFIC_DRIFT_RATE;
            if car.z < TRAFFIC_REAR_Z {
                car.respawn_ahead(rng);
            } else {
                car.update_sway();
            }
        }

        for target in &mut self.targets {
            target.z -= frame_move * target_scroll_mul;
            target.spin = (target.spin + dt * TARGET_SPIN_RATE) % std::f32::consts::TAU;
            if target.z < TARGET_REAR_Z {
                target.respawn_ahead(rng);
            }
        }
    }

    /// Push cars near the player back out ahead. Returns how many moved.
    pub fn clear_near<R: Rng + ?Sized>(&mut self, player_z: f32, room: f32, rng: &mut R) -> usize {
        let mut moved = 0;
        for car in &mut self.traffic {
            if (car.z - player_z).abs() < room {
                car.respawn_ahead(rng);
                moved += 1;
            }
        }
        moved
    }

    /// Re-roll every car (targets are kept)
    pub fn respawn_traffic<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for (slot, car) in self.traffic.iter_mut().enumerate() {
            let z = TRAFFIC_SPAWN_Z
                + slot as f32 * TRAFFIC_INITIAL_GAP
                + rng.random_range(0.0..TRAFFIC_SPAWN_JITTER);
            car.respawn_at(z, rng);
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

    fn pool(seed: u64) -> (EntityPool, Pcg32) {
        let bank = BuiltinBank::load().unwrap();
        let mut rng = Pcg32::seed_from_u64(seed);
        let round = RoundGenerator::new(&bank, "python")
            .unwrap()
            .next_round(None, &mut rng);
        (EntityPool::new(&round, &mut rng), rng)
    }

    #[test]
    fn test_traffic_spawns_ahead() {
        let (pool, _) = pool(1);
        for car in &pool.traffic {
            assert!(car.z >= TRAFFIC_SPAWN_Z);
            assert!(car.lane < LANE_COUNT);
            assert!((TRAFFIC_SPEED_MUL_MIN..=TRAFFIC_SPEED_MUL_MAX).contains(&car.speed_mul));
        }
    }

    #[test]
    fn test_traffic_recycles_in_place() {
        let (mut pool, mut rng) = pool(2);
        let ids: Vec<u32> = pool.traffic.iter().map(|c| c.id).collect();

        pool.traffic[0].z = TRAFFIC_REAR_Z + 0.01;
        pool.scroll(0.5, 0.1, 1.15, &mut rng);

        let car = &pool.traffic[0];
        assert!(car.z >= TRAFFIC_SPAWN_Z);
        assert!(car.z < TRAFFIC_SPAWN_Z + TRAFFIC_SPAWN_JITTER);
        assert_eq!(pool.traffic.iter().map(|c| c.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_targets_never_run_out() {
        let (mut pool, mut rng) = pool(3);
        for _ in 0..5_000 {
            pool.scroll(0.4, 0.05, 1.15, &mut rng);
            for target in &pool.targets {
                assert!(target.z >= TARGET_REAR_Z);
            }
        }
    }

    #[test]
    fn test_sway_stays_near_lane() {
        let (mut pool, mut rng) = pool(4);
        for _ in 0..500 {
            pool.scroll(0.1, 0.05, 1.15, &mut rng);
            for car in &pool.traffic {
                assert!((car.x - lane_x(car.lane)).abs() <= TRAFFIC_DRIFT_AMPLITUDE + 1e-4);
            }
        }
    }

    #[test]
    fn test_clear_near_makes_room() {
        let (mut pool, mut rng) = pool(5);
        pool.traffic[0].z = PLAYER_Z + 0.5;
        pool.traffic[1].z = PLAYER_Z - 3.0;

        let moved = pool.clear_near(PLAYER_Z, 6.0, &mut rng);
        assert!(moved >= 2);
        for car in &pool.traffic {
            assert!((car.z - PLAYER_Z).abs() >= 6.0);
        }
    }
}
