//! Meteor Dash entry point
//!
//! Opens the game device on an in-memory canvas, drives it with the motion
//! client and keeps a leaderboard between rounds.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use meteor_dash::client::{Controller, SimulatedSensor, play_round};
use meteor_dash::renderer::Canvas;
use meteor_dash::{Device, HighScores, Settings};

const SETTINGS_FILE: &str = "meteor-dash.json";
const HIGHSCORES_FILE: &str = "meteor-dash-scores.json";

/// Canvas cell size for the end-of-round printout
const ASCII_CELL: i32 = 10;

fn parse_difficulty(arg: Option<String>, max: u32) -> Result<u32, String> {
    let Some(arg) = arg else {
        return Ok(1);
    };
    match arg.trim().parse::<u32>() {
        Ok(d) if (1..=max).contains(&d) => Ok(d),
        _ => Err(format!("difficulty must be a number from 1 to {max}, got {arg:?}")),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Ask on stdin; anything but y/yes ends the game
fn play_again() -> bool {
    print!("Play again? (y/n) ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Meteor Dash starting...");

    let settings = Settings::load_or_default(Path::new(SETTINGS_FILE));
    let difficulty = match parse_difficulty(std::env::args().nth(1), settings.client.max_difficulty)
    {
        Ok(d) => d,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let scores_path = Path::new(HIGHSCORES_FILE);
    let mut scores = HighScores::load_or_default(scores_path);

    let canvas = Arc::new(Mutex::new(Canvas::default()));
    let device = Device::new(settings.clone(), canvas.clone());

    let seed = settings.client.seed.unwrap_or_else(clock_seed);
    let sensor = SimulatedSensor::new(seed);
    let mut controller = Controller::new(sensor, difficulty, settings.client.clone(), seed);
    if let Err(e) = controller.init() {
        eprintln!("Motion sensor failed to start: {e}");
        return ExitCode::FAILURE;
    }

    loop {
        *canvas.lock() = Canvas::default();
        let mut session = match device.open() {
            Ok(session) => session,
            Err(e) => {
                eprintln!("Could not open the game device: {e}");
                return ExitCode::FAILURE;
            }
        };

        let frame = device.settings().client.frame();
        let summary = match play_round(&mut controller, &mut session, frame, None) {
            Ok(summary) => summary,
            Err(e) => {
                eprintln!("Round aborted: {e}");
                return ExitCode::FAILURE;
            }
        };
        session.release();

        println!("{}", canvas.lock().ascii(ASCII_CELL));
        println!(
            "Score: {}  Difficulty: {}",
            summary.score, summary.difficulty
        );

        if scores.is_new_best(summary.score) {
            println!("New Highscore!");
        }
        if let Some(rank) = scores.record(summary.score, summary.difficulty) {
            log::info!("Score ranked #{rank}");
            if let Err(e) = scores.save(scores_path) {
                log::warn!("Failed to save high scores: {e}");
            }
        }

        if !play_again() {
            break;
        }
        controller.restart(difficulty);
    }

    log::info!("Bye");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_difficulty() {
        assert_eq!(parse_difficulty(None, 10), Ok(1));
        assert_eq!(parse_difficulty(Some("7".into()), 10), Ok(7));
        assert!(parse_difficulty(Some("0".into()), 10).is_err());
        assert!(parse_difficulty(Some("11".into()), 10).is_err());
        assert!(parse_difficulty(Some("hard".into()), 10).is_err());
    }
}
