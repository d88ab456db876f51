//! Game state machine
//!
//! Owns score, streak, lives and level, and reacts to the events the
//! simulation emits. Phases: Idle -> Running -> {Crashed, Idle}.

use core::fmt;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::bank::{BankError, QuestionBank};
use crate::consts::PLAYER_Z;
use crate::round::{Round, RoundGenerator};
use crate::script::{InvalidCode, Program, parse_program};
use crate::sim::{Frame, SimEvent, Simulation, StepInput, step};
use crate::tuning::{Tuning, TuningError};

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a program (fresh, stopped, or reset)
    Idle,
    /// Program is driving the car
    Running,
    /// Invalid program or out of lives; needs `run` or `reset`
    Crashed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashReason {
    Traffic,
    Invalid(InvalidCode),
}

impl CrashReason {
    pub fn message(&self) -> &'static str {
        match self {
            CrashReason::Traffic => "Traffic collision, game crashed.",
            CrashReason::Invalid(code) => code.crash_message(),
        }
    }
}

/// Player title derived from score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Rookie,
    Pro,
    Elite,
    Legend,
}

impl Rank {
    pub fn from_score(score: u32) -> Self {
        match score {
            120.. => Rank::Legend,
            60.. => Rank::Elite,
            30.. => Rank::Pro,
            _ => Rank::Rookie,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Rookie => "Rookie",
            Rank::Pro => "Pro",
            Rank::Elite => "Elite",
            Rank::Legend => "Legend",
        }
    }
}

/// Session counters. Persist across rounds, cleared only by `reset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub lives: u8,
    /// Always `1 + score / points_per_level`
    pub level: u32,
    pub correct_hits: u32,
    pub crash_reason: Option<CrashReason>,
}

impl GameState {
    pub fn new(max_lives: u8) -> Self {
        Self {
            score: 0,
            streak: 0,
            best_streak: 0,
            lives: max_lives,
            level: 1,
            correct_hits: 0,
            crash_reason: None,
        }
    }

    pub fn rank(&self) -> Rank {
        Rank::from_score(self.score)
    }
}

/// Why a session could not be started
#[derive(Debug)]
pub enum GameError {
    Bank(BankError),
    Tuning(TuningError),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bank(e) => write!(f, "question bank rejected: {e}"),
            Self::Tuning(e) => write!(f, "invalid tuning: {e}"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bank(e) => Some(e),
            Self::Tuning(e) => Some(e),
        }
    }
}

impl From<BankError> for GameError {
    fn from(e: BankError) -> Self {
        Self::Bank(e)
    }
}

impl From<TuningError> for GameError {
    fn from(e: TuningError) -> Self {
        Self::Tuning(e)
    }
}

/// What the HUD shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud<'a> {
    pub score: u32,
    pub lives: u8,
    pub streak: u32,
    pub best_streak: u32,
    pub level: u32,
    pub rank: Rank,
    pub active_command_label: &'static str,
    pub last_event_text: &'a str,
    pub crash_reason: Option<&'a CrashReason>,
    pub prompt: &'a str,
}

/// One play session: state machine, simulation and round dealer
#[derive(Debug, Clone)]
pub struct Game {
    pub state: GameState,
    phase: GamePhase,
    program: Program,
    sim: Simulation,
    round: Round,
    rounds: RoundGenerator,
    rng: Pcg32,
    tuning: Tuning,
    last_event: String,
    seed: u64,
}

impl Game {
    /// Start a session. Fails if the tuning is out of range or the bank has
    /// nothing to ask.
    pub fn new(
        seed: u64,
        bank: &dyn QuestionBank,
        language: &str,
        tuning: Tuning,
    ) -> Result<Self, GameError> {
        tuning.validate()?;
        let rounds = RoundGenerator::new(bank, language)?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let round = rounds.next_round(None, &mut rng);
        let sim = Simulation::new(&round, &mut rng);

        log::info!(
            "Game initialized with seed {} ({} questions, `{}`)",
            seed,
            rounds.pool_size(),
            rounds.language()
        );

        Ok(Self {
            state: GameState::new(tuning.max_lives),
            phase: GamePhase::Idle,
            program: Program::default(),
            sim,
            round,
            rounds,
            rng,
            tuning,
            last_event: String::from("Write some code and press run."),
            seed,
        })
    }

    /// Parse `code` and start driving. A rejected program crashes the game
    /// without touching score or entities.
    pub fn run(&mut self, code: &str) -> Result<(), InvalidCode> {
        let program = match parse_program(code) {
            Ok(program) => program,
            Err(err) => {
                log::warn!("Program rejected: {err}");
                self.last_event = err.crash_message().to_string();
                self.state.crash_reason = Some(CrashReason::Invalid(err.clone()));
                self.phase = GamePhase::Crashed;
                return Err(err);
            }
        };

        if self.state.lives == 0 {
            // Back on the road after running out of lives
            self.state.lives = self.tuning.max_lives;
            self.sim.pool.respawn_traffic(&mut self.rng);
        }

        log::info!(
            "Running {} actions at speed {:.2}",
            program.actions.len(),
            program.speed
        );
        self.last_event = format!(
            "Running {} action(s) at speed {:.2}.",
            program.actions.len(),
            program.speed
        );
        self.state.crash_reason = None;
        self.program = program;
        self.sim.reset_runtime();
        self.phase = GamePhase::Running;
        Ok(())
    }

    /// Pause without clearing anything
    pub fn stop(&mut self) {
        if self.phase == GamePhase::Running {
            self.phase = GamePhase::Idle;
            self.last_event = String::from("Stopped.");
            log::info!("Stopped at score {}", self.state.score);
        }
    }

    /// Clear every counter, deal a fresh round and rebuild the world
    pub fn reset(&mut self) {
        self.state = GameState::new(self.tuning.max_lives);
        self.program = Program::default();
        self.round = self
            .rounds
            .next_round(Some(&self.round.question_id), &mut self.rng);
        self.sim = Simulation::new(&self.round, &mut self.rng);
        self.phase = GamePhase::Idle;
        self.last_event = String::from("Reset. Write some code and press run.");
        log::info!("Game reset");
    }

    /// Switch question language and deal a new round from it
    pub fn set_language(&mut self, bank: &dyn QuestionBank, language: &str) -> Result<(), BankError> {
        self.rounds = RoundGenerator::new(bank, language)?;
        self.next_round();
        Ok(())
    }

    /// Advance one frame. Returns the raw events for audio/FX consumers.
    pub fn tick(&mut self, dt: f32) -> Vec<SimEvent> {
        let input = StepInput {
            running: self.phase == GamePhase::Running,
            program: &self.program,
            level: self.state.level,
            tuning: &self.tuning,
        };
        let events = step(&mut self.sim, &input, dt, &mut self.rng);

        for event in &events {
            if self.phase != GamePhase::Running {
                break;
            }
            self.apply_event(event);
        }

        events
    }

    fn apply_event(&mut self, event: &SimEvent) {
        match event {
            SimEvent::AttackMiss => {
                self.state.streak = 0;
                self.last_event = String::from("Missed! No star in range.");
                log::debug!("Attack missed");
            }
            SimEvent::AttackHit {
                text,
                is_correct: true,
                ..
            } => {
                let points = self.tuning.points_correct;
                self.state.score = self.state.score.saturating_add(points);
                self.state.streak += 1;
                self.state.best_streak = self.state.best_streak.max(self.state.streak);
                self.state.correct_hits += 1;
                self.last_event = format!("Correct! \"{text}\" +{points}");
                log::debug!("Correct hit, streak {}", self.state.streak);
                self.update_level();
                self.next_round();
            }
            SimEvent::AttackHit {
                text,
                is_correct: false,
                ..
            } => {
                let penalty = self.tuning.penalty_wrong;
                self.state.score = self.state.score.saturating_sub(penalty);
                self.state.streak = 0;
                self.last_event = format!("Wrong! \"{text}\" -{penalty}");
                log::debug!("Wrong hit");
                self.update_level();
                self.next_round();
            }
            SimEvent::TrafficCollision { car_id } => {
                self.state.lives = self.state.lives.saturating_sub(1);
                if self.state.lives == 0 {
                    self.state.crash_reason = Some(CrashReason::Traffic);
                    self.phase = GamePhase::Crashed;
                    self.last_event = CrashReason::Traffic.message().to_string();
                    log::info!("Crashed into traffic (car {car_id}), score {}", self.state.score);
                } else {
                    let moved = self.sim.pool.clear_near(
                        PLAYER_Z,
                        self.tuning.breathing_room,
                        &mut self.rng,
                    );
                    self.last_event = format!("Traffic hit! {} lives left.", self.state.lives);
                    log::debug!("Traffic hit by car {car_id}, cleared {moved} cars");
                }
            }
        }
    }

    fn update_level(&mut self) {
        let level = self.tuning.level_for_score(self.state.score);
        if level != self.state.level {
            log::info!("Level {} -> {}", self.state.level, level);
            self.state.level = level;
            self.sim.reset_runtime();
        }
    }

    /// Deal a round that differs from the current one (if the pool allows)
    fn next_round(&mut self) {
        self.round = self
            .rounds
            .next_round(Some(&self.round.question_id), &mut self.rng);
        self.sim.load_round(&self.round, &mut self.rng);
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn language(&self) -> &str {
        self.rounds.language()
    }

    pub fn hud(&self) -> Hud<'_> {
        let active_command_label = match (self.phase, self.sim.runtime.last_action) {
            (GamePhase::Running, Some(action)) => action.label(),
            (GamePhase::Running, None) => "Cruise",
            _ => "Idle",
        };
        Hud {
            score: self.state.score,
            lives: self.state.lives,
            streak: self.state.streak,
            best_streak: self.state.best_streak,
            level: self.state.level,
            rank: self.state.rank(),
            active_command_label,
            last_event_text: &self.last_event,
            crash_reason: self.state.crash_reason.as_ref(),
            prompt: &self.round.prompt,
        }
    }

    /// Renderer snapshot for the current frame
    pub fn frame(&self) -> Frame<'_> {
        self.sim.frame(self.tuning.pulse_duration)
    }
}
