//! Motion client
//!
//! Turns sensor tilt into move commands, rolls random meteor spawns, raises
//! the difficulty as the score climbs, and drives a session until the
//! character is hit.

pub mod imu;

use std::fmt;
use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::device::{DeviceError, Session};
use crate::settings::ClientSettings;
pub use imu::{ImuReading, MotionSensor, SensorError, SimulatedSensor};

/// Rightmost character column the client will ask for
pub const CHARACTER_MAX_X: i32 = 450;
/// Rightmost meteor spawn column
pub const SPAWN_MAX_X: i32 = 420;
/// Base 1-in-N spawn odds at difficulty 1, before the 4x difficulty divisor
pub const SPAWN_ODDS: u32 = 200;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("motion sensor: {0}")]
    Sensor(#[from] SensorError),
    #[error("device: {0}")]
    Device(#[from] DeviceError),
}

/// A request the client sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    SetFallingRate(i32),
    Move { x: i32, spawn_x: Option<i32> },
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientCommand::SetFallingRate(rate) => write!(f, "-1,{rate},"),
            ClientCommand::Move { x, spawn_x } => write!(f, "{x},{},", spawn_x.unwrap_or(-1)),
        }
    }
}

impl ClientCommand {
    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

/// Falling rate sent for a difficulty level
pub fn falling_rate_for(difficulty: u32) -> i32 {
    4 + (difficulty / 2) as i32
}

/// New character column after one gyro sample, clamped to the field
pub fn travel(gyro_x: f32, gyro_scale: f32, difficulty: u32, current_x: i32) -> i32 {
    let steps = (-gyro_x / gyro_scale).round() as i32;
    let delta = steps.saturating_mul(i32::try_from(difficulty).unwrap_or(i32::MAX));
    current_x.saturating_add(delta).clamp(0, CHARACTER_MAX_X)
}

/// Roll for a spawn: 1 in `max(1, 200 / (4 * difficulty))`
pub fn roll_spawn<R: Rng>(rng: &mut R, difficulty: u32) -> Option<i32> {
    let odds = (SPAWN_ODDS / (4 * difficulty.max(1))).max(1);
    if rng.random_range(1..=odds) == 1 {
        Some(rng.random_range(0..=SPAWN_MAX_X))
    } else {
        None
    }
}

/// Score and difficulty for one round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub score: u32,
    pub difficulty: u32,
    max_difficulty: u32,
    points_per_level: u32,
}

impl Progress {
    pub fn new(difficulty: u32, settings: &ClientSettings) -> Self {
        Self {
            score: 0,
            difficulty: difficulty.clamp(1, settings.max_difficulty.max(1)),
            max_difficulty: settings.max_difficulty.max(1),
            points_per_level: settings.points_per_level.max(1),
        }
    }

    /// Score one frame; returns the new difficulty when a level boundary is crossed
    pub fn advance(&mut self) -> Option<u32> {
        let before = self.score / self.points_per_level;
        self.score = self.score.saturating_add(self.difficulty);
        let after = self.score / self.points_per_level;

        if after > before && self.difficulty < self.max_difficulty {
            self.difficulty += 1;
            log::info!("Moving up to difficulty {} at score {}", self.difficulty, self.score);
            Some(self.difficulty)
        } else {
            None
        }
    }
}

/// Sensor-to-command mapper for one round
pub struct Controller<S> {
    sensor: S,
    rng: Pcg32,
    settings: ClientSettings,
    x: i32,
    progress: Progress,
}

impl<S: MotionSensor> Controller<S> {
    pub fn new(sensor: S, difficulty: u32, settings: ClientSettings, seed: u64) -> Self {
        Self {
            sensor,
            rng: Pcg32::seed_from_u64(seed),
            x: settings.start_x.clamp(0, CHARACTER_MAX_X),
            progress: Progress::new(difficulty, &settings),
            settings,
        }
    }

    pub fn init(&mut self) -> Result<(), SensorError> {
        self.sensor.init()
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Rate command for the current difficulty
    pub fn rate_command(&self) -> ClientCommand {
        ClientCommand::SetFallingRate(falling_rate_for(self.progress.difficulty))
    }

    /// Start a new round at `difficulty`, keeping the sensor and RNG
    pub fn restart(&mut self, difficulty: u32) {
        self.x = self.settings.start_x.clamp(0, CHARACTER_MAX_X);
        self.progress = Progress::new(difficulty, &self.settings);
    }

    /// Commands for one frame: a rate update on level-up, then a move
    pub fn step(&mut self) -> Result<Vec<ClientCommand>, SensorError> {
        let mut commands = Vec::with_capacity(2);
        if self.progress.advance().is_some() {
            commands.push(self.rate_command());
        }

        let reading = self.sensor.read()?;
        let difficulty = self.progress.difficulty;
        self.x = travel(reading.gyro_x, self.settings.gyro_scale, difficulty, self.x);
        let spawn_x = roll_spawn(&mut self.rng, difficulty);

        commands.push(ClientCommand::Move { x: self.x, spawn_x });
        Ok(commands)
    }
}

/// Where client requests go
pub trait Link {
    fn send(&mut self, buf: &[u8]) -> Result<usize, DeviceError>;
}

impl Link for Session {
    fn send(&mut self, buf: &[u8]) -> Result<usize, DeviceError> {
        self.write(buf)
    }
}

/// How a round finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub score: u32,
    pub difficulty: u32,
    pub frames: u64,
    /// False when the frame limit ran out first
    pub game_over: bool,
}

/// Drive `link` until a collision, or until `frame_limit` frames have run
pub fn play_round<S, L>(
    controller: &mut Controller<S>,
    link: &mut L,
    frame: Duration,
    frame_limit: Option<u64>,
) -> Result<RoundSummary, ClientError>
where
    S: MotionSensor,
    L: Link,
{
    link.send(&controller.rate_command().encode())?;

    let mut frames = 0u64;
    while frame_limit.is_none_or(|limit| frames < limit) {
        if !frame.is_zero() {
            thread::sleep(frame);
        }
        frames += 1;

        for command in controller.step()? {
            match link.send(&command.encode()) {
                Ok(_) => {}
                Err(e) if e.is_game_over() => {
                    log::info!("Hit a meteor after {frames} frames");
                    return Ok(summarize(controller, frames, true));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(summarize(controller, frames, false))
}

fn summarize<S>(controller: &Controller<S>, frames: u64, game_over: bool) -> RoundSummary {
    RoundSummary {
        score: controller.progress.score,
        difficulty: controller.progress.difficulty,
        frames,
        game_over,
    }
}
