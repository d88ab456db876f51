//! Per-frame simulation step
//!
//! Order within one step is fixed: cooldown decay, command application,
//! player motion, world scroll, collision detection, attack resolution.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{RuntimeState, Simulation};
use crate::consts::*;
use crate::lane_x;
use crate::script::{Action, Program};
use crate::tuning::Tuning;

/// Read-only inputs for one step
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    /// Only the pulse ring animates when false
    pub running: bool,
    pub program: &'a Program,
    pub level: u32,
    pub tuning: &'a Tuning,
}

/// Something the game state machine must react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Attack fired with no star in range
    AttackMiss,
    AttackHit {
        option_id: String,
        text: String,
        is_correct: bool,
    },
    TrafficCollision {
        car_id: u32,
    },
}

/// Advance the simulation by `dt` seconds and report what happened
pub fn step<R: Rng + ?Sized>(
    sim: &mut Simulation,
    input: &StepInput,
    dt: f32,
    rng: &mut R,
) -> Vec<SimEvent> {
    let mut events = Vec::new();
    let t = input.tuning;
    let dt = dt.max(0.0);

    // Pulse ring is visual only and fades even while stopped
    sim.runtime.pulse_timer = (sim.runtime.pulse_timer - dt).max(0.0);

    if !input.running || dt == 0.0 {
        return events;
    }

    // 1. Cooldown decay
    let rt = &mut sim.runtime;
    rt.attack_cooldown = (rt.attack_cooldown - dt).max(0.0);
    rt.traffic_hit_cooldown = (rt.traffic_hit_cooldown - dt).max(0.0);
    rt.speed_mod += (1.0 - rt.speed_mod) * (t.speed_mod_relax_rate * dt).clamp(0.0, 1.0);

    // 2. Command cadence
    let mut attack_fired = false;
    rt.command_elapsed += dt;
    if rt.command_elapsed >= t.command_interval {
        rt.command_elapsed = 0.0;
        if let Some(action) = input.program.action_at(rt.command_index) {
            attack_fired = apply_action(rt, action, t);
            rt.command_index = (rt.command_index + 1) % input.program.actions.len();
            rt.last_action = Some(action);
            log::trace!("Applied {:?}", action);
        }
    }

    // 3. Player motion
    sim.player
        .move_toward(lane_x(sim.runtime.lane_index), dt, t.lane_lerp_rate);

    // 4. World scroll
    let road_speed = t.road_speed(input.level, input.program.speed, sim.runtime.speed_mod);
    let frame_move = road_speed * dt;
    sim.stripe_offset = (sim.stripe_offset + frame_move).rem_euclid(STRIPE_SPACING);
    sim.pool.scroll(frame_move, dt, t.target_scroll_mul, rng);

    // 5. Traffic collisions (debounced)
    if sim.runtime.traffic_hit_cooldown <= 0.0 {
        let player = sim.player.pos();
        let hit = sim.pool.traffic.iter().find(|car| {
            (car.x - player.x).abs() < t.traffic_hit_half_width
                && (car.z - player.y).abs() < t.traffic_hit_half_depth
        });
        if let Some(car) = hit {
            sim.runtime.traffic_hit_cooldown = t.traffic_hit_cooldown;
            events.push(SimEvent::TrafficCollision { car_id: car.id });
        }
    }

    // 6. Attack resolution: nearest star only
    if attack_fired {
        let player = sim.player.pos();
        let nearest = sim
            .pool
            .targets
            .iter()
            .map(|target| (target, target.pos().distance(player)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match nearest {
            Some((target, dist)) if dist <= t.attack_radius => {
                events.push(SimEvent::AttackHit {
                    option_id: target.option_id.clone(),
                    text: target.text.clone(),
                    is_correct: target.is_correct,
                });
            }
            _ => events.push(SimEvent::AttackMiss),
        }
    }

    events
}

/// Apply one action. Returns true if an attack actually fired.
fn apply_action(rt: &mut RuntimeState, action: Action, t: &Tuning) -> bool {
    match action {
        Action::Lane(dir) => {
            let lane = rt.lane_index as isize + dir.delta();
            rt.lane_index = lane.clamp(0, LANE_COUNT as isize - 1) as usize;
            false
        }
        Action::Boost => {
            rt.speed_mod = (rt.speed_mod + t.boost_step).clamp(t.boost_min, t.boost_max);
            false
        }
        Action::Brake => {
            rt.speed_mod = (rt.speed_mod - t.brake_step).clamp(t.brake_min, t.brake_max);
            false
        }
        Action::Attack => {
            if rt.attack_cooldown > 0.0 {
                return false;
            }
            rt.attack_cooldown = t.attack_cooldown;
            rt.pulse_timer = t.pulse_duration;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::BuiltinBank;
    use crate::round::RoundGenerator;
    use crate::script::{LaneDir, parse_program};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup(seed: u64) -> (Simulation, Pcg32) {
        let bank = BuiltinBank::load().unwrap();
        let mut rng = Pcg32::seed_from_u64(seed);
        let round = RoundGenerator::new(&bank, "python")
            .unwrap()
            .next_round(None, &mut rng);
        let sim = Simulation::new(&round, &mut rng);
        (sim, rng)
    }

    /// Park every car and star far ahead so nothing interferes
    fn clear_road(sim: &mut Simulation) {
        for car in &mut sim.pool.traffic {
            car.z = 40.0;
        }
        for target in &mut sim.pool.targets {
            target.z = 40.0;
        }
    }

    fn input<'a>(program: &'a Program, tuning: &'a Tuning) -> StepInput<'a> {
        StepInput {
            running: true,
            program,
            level: 1,
            tuning,
        }
    }

    #[test]
    fn test_command_cadence() {
        let (mut sim, mut rng) = setup(1);
        clear_road(&mut sim);
        let tuning = Tuning::default();
        let program = parse_program("left\nright\nboost").unwrap();

        // 0.4s: nothing applied yet
        for _ in 0..4 {
            step(&mut sim, &input(&program, &tuning), 0.1, &mut rng);
        }
        assert_eq!(sim.runtime.command_index, 0);
        assert_eq!(sim.runtime.lane_index, START_LANE);

        // Crossing 0.42s applies the first action
        step(&mut sim, &input(&program, &tuning), 0.1, &mut rng);
        assert_eq!(sim.runtime.command_index, 1);
        assert_eq!(sim.runtime.lane_index, 0);
        assert_eq!(sim.runtime.last_action, Some(Action::Lane(LaneDir::Left)));
        assert_eq!(sim.runtime.command_elapsed, 0.0);
    }

    #[test]
    fn test_command_index_wraps() {
        let (mut sim, mut rng) = setup(2);
        clear_road(&mut sim);
        let tuning = Tuning::default();
        let program = parse_program("left\nright").unwrap();

        for _ in 0..3 {
            clear_road(&mut sim);
            step(&mut sim, &input(&program, &tuning), 0.5, &mut rng);
        }
        assert_eq!(sim.runtime.command_index, 1);
        assert_eq!(sim.runtime.last_action, Some(Action::Lane(LaneDir::Left)));
    }

    #[test]
    fn test_lane_clamped() {
        let (mut sim, mut rng) = setup(3);
        let tuning = Tuning::default();
        let program = parse_program("left").unwrap();

        for _ in 0..6 {
            clear_road(&mut sim);
            step(&mut sim, &input(&program, &tuning), 0.5, &mut rng);
        }
        assert_eq!(sim.runtime.lane_index, 0);
        // Player eased all the way into the left lane without overshooting
        assert!(sim.player.x >= lane_x(0) - 1e-4);
        assert!((sim.player.x - lane_x(0)).abs() < 0.05);
    }

    #[test]
    fn test_empty_program_idles() {
        let (mut sim, mut rng) = setup(4);
        clear_road(&mut sim);
        let tuning = Tuning::default();
        let program = Program::default();

        let events = step(&mut sim, &input(&program, &tuning), 1.0, &mut rng);
        assert!(events.is_empty());
        assert_eq!(sim.runtime.command_index, 0);
        assert_eq!(sim.runtime.last_action, None);
    }

    #[test]
    fn test_boost_is_transient() {
        let (mut sim, mut rng) = setup(5);
        let tuning = Tuning::default();
        let boost = parse_program("boost").unwrap();

        clear_road(&mut sim);
        step(&mut sim, &input(&boost, &tuning), 0.45, &mut rng);
        assert!(sim.runtime.speed_mod > 1.2);

        // Idle for a while: relaxes back toward 1
        let idle = Program::default();
        for _ in 0..100 {
            clear_road(&mut sim);
            step(&mut sim, &input(&idle, &tuning), 0.05, &mut rng);
        }
        assert!((sim.runtime.speed_mod - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_brake_clamped() {
        let mut rt = RuntimeState::default();
        let t = Tuning::default();
        for _ in 0..10 {
            apply_action(&mut rt, Action::Brake, &t);
        }
        assert_eq!(rt.speed_mod, t.brake_min);

        let mut rt = RuntimeState::default();
        for _ in 0..10 {
            apply_action(&mut rt, Action::Boost, &t);
        }
        assert_eq!(rt.speed_mod, t.boost_max);
    }

    #[test]
    fn test_attack_respects_cooldown() {
        let mut rt = RuntimeState::default();
        let t = Tuning::default();
        assert!(apply_action(&mut rt, Action::Attack, &t));
        assert_eq!(rt.attack_cooldown, t.attack_cooldown);
        assert_eq!(rt.pulse_timer, t.pulse_duration);
        assert!(!apply_action(&mut rt, Action::Attack, &t));
    }

    #[test]
    fn test_attack_hits_nearest_star() {
        let (mut sim, mut rng) = setup(6);
        clear_road(&mut sim);
        let tuning = Tuning::default();
        let program = parse_program("attack").unwrap();

        // Two stars in range; the closer one must win
        sim.pool.targets[1].x = 0.0;
        sim.pool.targets[1].z = PLAYER_Z + 3.0;
        sim.pool.targets[2].x = 0.0;
        sim.pool.targets[2].z = PLAYER_Z + 2.2;
        let expected = sim.pool.targets[2].option_id.clone();

        let events = step(&mut sim, &input(&program, &tuning), 0.45, &mut rng);
        assert_eq!(events.len(), 1);
        match &events[0] {
            SimEvent::AttackHit { option_id, .. } => assert_eq!(*option_id, expected),
            other => panic!("expected a hit, got {other:?}"),
        }
    }

    /// Single star parked beside the player with stars held still
    fn attack_at_offset(seed: u64, dx: f32) -> Vec<SimEvent> {
        let (mut sim, mut rng) = setup(seed);
        clear_road(&mut sim);
        let tuning = Tuning {
            target_scroll_mul: 0.0,
            ..Default::default()
        };
        let program = parse_program("attack").unwrap();
        sim.pool.targets[0].x = sim.player.x + dx;
        sim.pool.targets[0].z = PLAYER_Z;

        step(&mut sim, &input(&program, &tuning), 0.43, &mut rng)
    }

    #[test]
    fn test_attack_radius_is_inclusive() {
        let radius = Tuning::default().attack_radius;
        let events = attack_at_offset(10, radius);
        assert!(matches!(events.as_slice(), [SimEvent::AttackHit { .. }]));

        let events = attack_at_offset(10, radius + 0.01);
        assert_eq!(events, vec![SimEvent::AttackMiss]);
    }

    #[test]
    fn test_attack_out_of_range_misses() {
        let (mut sim, mut rng) = setup(7);
        clear_road(&mut sim);
        let tuning = Tuning::default();
        let program = parse_program("attack").unwrap();

        let events = step(&mut sim, &input(&program, &tuning), 0.45, &mut rng);
        assert_eq!(events, vec![SimEvent::AttackMiss]);
        assert!(sim.runtime.pulse_timer > 0.0);
    }

    #[test]
    fn test_traffic_collision_debounced() {
        let (mut sim, mut rng) = setup(8);
        let tuning = Tuning::default();
        let program = Program::default();

        let mut hits = 0;
        // Keep a car glued to the player for 0.9s
        for _ in 0..9 {
            clear_road(&mut sim);
            sim.pool.traffic[0].lane = START_LANE;
            sim.pool.traffic[0].x = sim.player.x;
            sim.pool.traffic[0].z = PLAYER_Z + 0.2;
            let events = step(&mut sim, &input(&program, &tuning), 0.1, &mut rng);
            hits += events
                .iter()
                .filter(|e| matches!(e, SimEvent::TrafficCollision { .. }))
                .count();
        }
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_stopped_only_fades_pulse() {
        let (mut sim, mut rng) = setup(9);
        let tuning = Tuning::default();
        let program = parse_program("left").unwrap();
        sim.runtime.pulse_timer = 0.2;
        sim.runtime.attack_cooldown = 0.5;
        let before = sim.pool.traffic.clone();

        let stopped = StepInput {
            running: false,
            ..input(&program, &tuning)
        };
        step(&mut sim, &stopped, 0.1, &mut rng);

        assert!((sim.runtime.pulse_timer - 0.1).abs() < 1e-6);
        assert_eq!(sim.runtime.attack_cooldown, 0.5);
        assert_eq!(sim.pool.traffic, before);
    }

    #[test]
    fn test_determinism() {
        let (mut a, mut rng_a) = setup(1234);
        let (mut b, mut rng_b) = setup(1234);
        let tuning = Tuning::default();
        let program = parse_program("left\nattack\nboost\nright\nbrake").unwrap();

        for i in 0..600 {
            let dt = if i % 3 == 0 { 1.0 / 60.0 } else { 1.0 / 30.0 };
            let ea = step(&mut a, &input(&program, &tuning), dt, &mut rng_a);
            let eb = step(&mut b, &input(&program, &tuning), dt, &mut rng_b);
            assert_eq!(ea, eb);
        }
        assert_eq!(a.runtime, b.runtime);
        assert_eq!(a.pool.traffic, b.pool.traffic);
        assert_eq!(a.player, b.player);
    }
}
