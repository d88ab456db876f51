//! Code Racer headless driver
//!
//! Feeds a program to the game and steps it at a fixed frame rate, printing
//! events (and optionally every renderer frame as JSON lines).
//!
//! Usage:
//!   code-racer --code "left\nattack" --seconds 20
//!   code-racer my_program.txt --language rust --frames
//!   RUST_LOG=debug code-racer my_program.txt

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use code_racer::sim::SimEvent;
use code_racer::{BuiltinBank, Game, GamePhase, Tuning};

const DEMO_PROGRAM: &str = "# any style works, only keywords matter\n\
speed = 1.4\n\
left\n\
attack()\n\
right\n\
attack()\n\
right\n\
attack()\n\
boost\n";

#[derive(Parser)]
#[command(name = "code-racer")]
#[command(about = "Drive the lane-racing quiz game with a keyword program")]
struct Args {
    /// File containing the program (defaults to a built-in demo)
    program: Option<PathBuf>,

    /// Program text given inline (`\n` separates lines)
    #[arg(long, conflicts_with = "program")]
    code: Option<String>,

    /// RNG seed for a reproducible session
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Question language key
    #[arg(long, default_value = "python")]
    language: String,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 30.0)]
    seconds: f32,

    /// Simulated frames per second
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// JSON file overriding gameplay tuning
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Print every frame snapshot as a JSON line
    #[arg(long)]
    frames: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let code = match (&args.program, &args.code) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(inline)) => inline.replace("\\n", "\n"),
        (None, None) => DEMO_PROGRAM.to_string(),
    };

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };

    let bank = BuiltinBank::load().context("built-in question bank is invalid")?;
    let mut game = Game::new(args.seed, &bank, &args.language, tuning)?;
    log::info!("Code Racer (headless) starting, seed {}", game.seed());

    println!("Question: {}", game.round().prompt);
    if let Err(err) = game.run(&code) {
        println!("Crash: {} ({err})", err.crash_message());
        return Ok(());
    }

    let fps = args.fps.max(1);
    let dt = 1.0 / fps as f32;
    let ticks = (args.seconds.max(0.0) * fps as f32).round() as u64;

    for tick in 0..ticks {
        let events = game.tick(dt);
        let time = (tick + 1) as f32 * dt;

        for event in &events {
            match event {
                SimEvent::AttackHit { .. } | SimEvent::AttackMiss => {
                    println!("[{time:6.2}s] {}", game.hud().last_event_text);
                    if matches!(event, SimEvent::AttackHit { .. }) {
                        println!("          Next question: {}", game.round().prompt);
                    }
                }
                SimEvent::TrafficCollision { car_id } => {
                    println!(
                        "[{time:6.2}s] Car {car_id}: {}",
                        game.hud().last_event_text
                    );
                }
            }
        }

        if args.frames {
            println!("{}", serde_json::to_string(&game.frame())?);
        }

        if game.phase() == GamePhase::Crashed {
            break;
        }
    }

    let hud = game.hud();
    println!();
    println!("=== RESULTS ===");
    println!("  Score:       {}", hud.score);
    println!("  Level:       {}", hud.level);
    println!("  Rank:        {}", hud.rank.as_str());
    println!("  Lives:       {}", hud.lives);
    println!("  Best streak: {}", hud.best_streak);
    if let Some(reason) = hud.crash_reason {
        println!("  Crash:       {}", reason.message());
    }

    Ok(())
}
