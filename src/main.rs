//! Batch simulation CLI.
//!
//! Plays one or more AI-only sessions of a scenario and prints a summary.
//!
//! Usage:
//!   cargo run --release -- <scenario.json> [OPTIONS]
//!
//! Options:
//!   --games N    Number of games to play (default: 1)
//!   --rounds N   Round cap per game (default: 500)
//!   --seed N     Random seed, 0 for entropy (default: 0)
//!   --save FILE  Write the final state of game 0 to FILE
//!   --quiet      Suppress per-game output

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use hegemon::rng::GameRng;
use hegemon::save::encode_save;
use hegemon::scenario::{self, ScenarioDef};

struct GameResult {
    winner: Option<String>,
    rounds: u32,
    final_state: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut scenario_path: Option<PathBuf> = None;
    let mut games: usize = 1;
    let mut max_rounds: u32 = 500;
    let mut seed: u64 = 0;
    let mut save_path: Option<PathBuf> = None;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                i += 1;
                games = args[i].parse().expect("invalid --games value");
            }
            "--rounds" => {
                i += 1;
                max_rounds = args[i].parse().expect("invalid --rounds value");
            }
            "--seed" => {
                i += 1;
                seed = args[i].parse().expect("invalid --seed value");
            }
            "--save" => {
                i += 1;
                save_path = Some(PathBuf::from(&args[i]));
            }
            "--quiet" => {
                quiet = true;
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other if scenario_path.is_none() && !other.starts_with("--") => {
                scenario_path = Some(PathBuf::from(other));
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(path) = scenario_path else {
        print_usage();
        process::exit(1);
    };

    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to read {}: {}", path.display(), e);
            process::exit(1);
        }
    };
    let def: ScenarioDef = match serde_json::from_str(&text) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("malformed scenario {}: {}", path.display(), e);
            process::exit(1);
        }
    };
    // Validate the definition once before forking into games.
    if let Err(e) = scenario::build_map(&def) {
        eprintln!("bad scenario {}: {}", path.display(), e);
        process::exit(1);
    }

    let keep_first = save_path.is_some();
    let start = Instant::now();
    let results: Vec<GameResult> = (0..games)
        .into_par_iter()
        .map(|g| play_game(&def, seed, g, max_rounds, keep_first && g == 0))
        .collect();
    let elapsed = start.elapsed();

    if !quiet {
        for (g, r) in results.iter().enumerate() {
            match &r.winner {
                Some(w) => println!("game {}: {} won in round {}", g, w, r.rounds),
                None => println!("game {}: no winner after {} rounds", g, r.rounds),
            }
        }
        let mut standings: Vec<(String, usize)> = def
            .forces
            .iter()
            .map(|f| {
                let wins = results
                    .iter()
                    .filter(|r| r.winner.as_deref() == Some(f.nickname.as_str()))
                    .count();
                (f.nickname.clone(), wins)
            })
            .collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1));
        let draws = results.iter().filter(|r| r.winner.is_none()).count();
        println!("---");
        for (nick, wins) in &standings {
            println!("{:>12}  {} wins", nick, wins);
        }
        println!("{:>12}  {} draws", "-", draws);
        println!(
            "{} games in {:.1}s ({:.1} games/s)",
            games,
            elapsed.as_secs_f64(),
            games as f64 / elapsed.as_secs_f64().max(1e-9)
        );
    }

    if let Some(out) = save_path {
        let state = results
            .first()
            .and_then(|r| r.final_state.clone())
            .unwrap_or_default();
        if let Err(e) = fs::write(&out, state) {
            eprintln!("failed to write {}: {}", out.display(), e);
            process::exit(1);
        }
        if !quiet {
            println!("wrote final state of game 0 to {}", out.display());
        }
    }
}

fn play_game(
    def: &ScenarioDef,
    seed: u64,
    index: usize,
    max_rounds: u32,
    keep_state: bool,
) -> GameResult {
    // Scenarios validate before the batch starts.
    let mut map = scenario::build_map(def).expect("scenario validated before batch");
    let mut rng = if seed == 0 {
        GameRng::from_entropy()
    } else {
        GameRng::seeded(seed.wrapping_add(index as u64))
    };

    let winner = loop {
        if let Some(w) = map.sole_survivor() {
            break Some(w);
        }
        if map.round > max_rounds {
            break None;
        }
        if map.next_turn(&mut rng).is_none() {
            break None;
        }
    };

    GameResult {
        winner: winner.map(|w| map.force(w).nickname.clone()),
        rounds: map.round,
        final_state: keep_state.then(|| encode_save(&map)),
    }
}

fn print_usage() {
    eprintln!("Usage: hegemon <scenario.json> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games N    Number of games to play (default: 1)");
    eprintln!("  --rounds N   Round cap per game (default: 500)");
    eprintln!("  --seed N     Random seed, 0 for entropy (default: 0)");
    eprintln!("  --save FILE  Write the final state of game 0 to FILE");
    eprintln!("  --quiet      Suppress per-game output");
}
