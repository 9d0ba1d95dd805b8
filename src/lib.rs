//! Meteor Dash - dodge falling meteors by tilting a motion sensor
//!
//! Core modules:
//! - `sim`: Game state engine (meteor pool, tick pass, collisions, request protocol)
//! - `renderer`: Display surface capability, erase/paint synchronizer, banner glyphs
//! - `scheduler`: Periodic tick thread with synchronous disarm
//! - `device`: One-session-at-a-time write/read façade over the engine
//! - `client`: Motion sensor mapping, difficulty progression, play loop
//! - `settings`: Data-driven tuning
//! - `highscores`: Leaderboard persistence

pub mod client;
pub mod device;
pub mod highscores;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod sim;

pub use device::{Device, DeviceError, Session};
pub use highscores::HighScores;
pub use settings::{ParsePolicy, Settings};

/// Game configuration constants
pub mod consts {
    /// Visible play-field width (pixels)
    pub const FIELD_WIDTH: i32 = 500;
    /// Visible play-field height (pixels); meteors past this are evicted
    pub const FIELD_HEIGHT: i32 = 280;

    /// Fixed meteor pool capacity
    pub const MAX_METEORS: usize = 32;
    /// Default meteor width/height, also the hit-box size
    pub const DEFAULT_SPAWN_SIZE: i32 = 75;
    /// Default pixels per tick
    pub const DEFAULT_FALLING_RATE: i32 = 4;
    /// Default tick period
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

    /// Character defaults - fixed row near the bottom of the field
    pub const CHARACTER_Y: i32 = 250;
    pub const CHARACTER_SIZE: i32 = 20;
    pub const CHARACTER_START_X: i32 = 250;

    /// Largest accepted value for either request field
    pub const MAX_FIELD_VALUE: i32 = 500;
    /// Largest accepted request, in bytes
    pub const MAX_REQUEST_LEN: usize = 16;

    /// Game over banner placement
    pub const BANNER_ORIGIN: (i32, i32) = (100, 50);
    pub const BANNER_GLYPH_SIZE: i32 = 10;

    /// Status returned for a write that ended the session (ENOENT)
    pub const STATUS_COLLISION: isize = -2;
    pub const STATUS_OUT_OF_MEMORY: isize = -12;
    pub const STATUS_BAD_ADDRESS: isize = -14;
    pub const STATUS_INVALID_ARGUMENT: isize = -22;
}
