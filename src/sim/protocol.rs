//! Request protocol
//!
//! Requests are short ASCII messages of the form `"<field0>,<field1>,"`.
//! Only the first two comma-separated tokens matter:
//! - `field0 < 0` and `field1 < 280`: set the falling rate to `field1`
//!   and step the meteor palette
//! - otherwise: move the character to `field0`, then spawn a meteor at
//!   `field1` when it is positive
//!
//! Values above 500 in either field are accepted and ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::{character_hit, spawn_blocked};
use super::palette::Color;
use super::state::{GamePhase, GameState, Meteor, PoolError};
use super::tick::Redraw;
use crate::consts::*;

/// What to do with a field that isn't a base-10 integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Reject the whole request
    #[default]
    Strict,
    /// Log it and carry on with 0
    Lenient,
}

/// Request failures, each mapped to a signed status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("field {field} is not a base-10 integer: {token:?}")]
    MalformedInput { field: usize, token: String },
    #[error("request of {len} bytes does not fit the request buffer")]
    BadAddress { len: usize },
    #[error("out of memory while spawning a meteor")]
    OutOfMemory,
    #[error("character collided with a meteor")]
    Collision,
}

impl ProtocolError {
    /// Errno-style status reported back to the writer
    pub fn status(&self) -> isize {
        match self {
            ProtocolError::MalformedInput { .. } => STATUS_INVALID_ARGUMENT,
            ProtocolError::BadAddress { .. } => STATUS_BAD_ADDRESS,
            ProtocolError::OutOfMemory => STATUS_OUT_OF_MEMORY,
            ProtocolError::Collision => STATUS_COLLISION,
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, ProtocolError::Collision)
    }
}

/// A decoded request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// A field was above the accepted range; nothing happens
    Ignored,
    /// Difficulty update
    SetFallingRate { rate: i32 },
    /// Move the character and maybe spawn a meteor
    Move { x: i32, spawn_x: Option<i32> },
}

impl Command {
    /// Classify two raw fields in dispatch priority order
    pub fn from_fields(field0: i32, field1: i32) -> Self {
        if field0 > MAX_FIELD_VALUE || field1 > MAX_FIELD_VALUE {
            Command::Ignored
        } else if field0 < 0 && field1 < FIELD_HEIGHT {
            Command::SetFallingRate { rate: field1 }
        } else {
            Command::Move {
                x: field0,
                spawn_x: (field1 > 0).then_some(field1),
            }
        }
    }
}

/// Decode a raw request buffer
pub fn decode(buf: &[u8], policy: ParsePolicy) -> Result<Command, ProtocolError> {
    if buf.len() > MAX_REQUEST_LEN {
        return Err(ProtocolError::BadAddress { len: buf.len() });
    }

    let text = String::from_utf8_lossy(buf);
    let mut tokens = text.split(',');
    let field0 = parse_field(0, tokens.next(), policy)?;
    let field1 = parse_field(1, tokens.next(), policy)?;

    Ok(Command::from_fields(field0, field1))
}

fn parse_field(field: usize, token: Option<&str>, policy: ParsePolicy) -> Result<i32, ProtocolError> {
    let raw = token.unwrap_or("");
    let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');

    match trimmed.parse::<i32>() {
        Ok(value) => Ok(value),
        Err(_) => {
            let err = ProtocolError::MalformedInput {
                field,
                token: raw.to_string(),
            };
            match policy {
                ParsePolicy::Strict => Err(err),
                ParsePolicy::Lenient => {
                    log::warn!("{err}; using 0");
                    Ok(0)
                }
            }
        }
    }
}

/// Result of a spawn attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawn {
    NotRequested,
    Spawned(Meteor),
    /// Too close to a meteor still near the top
    Overlapping,
    /// Pool at capacity; dropped
    PoolFull,
}

/// What a dispatched command changed, for the caller to paint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    FallingRate { rate: i32, color: Color },
    Moved { character: Redraw, spawn: Spawn },
}

/// Apply a command to the game state
///
/// Must run under the state lock for its whole duration: the collision and
/// overlap scans read every meteor. On `Err(Collision)` the phase has been
/// set to `GameOver` and the caller owns painting the end screen.
pub fn dispatch(state: &mut GameState, command: Command) -> Result<Outcome, ProtocolError> {
    if state.phase == GamePhase::GameOver {
        return Err(ProtocolError::Collision);
    }

    match command {
        Command::Ignored => Ok(Outcome::Ignored),
        Command::SetFallingRate { rate } => {
            state.falling_rate = rate;
            let color = state.color.advance();
            log::info!("Falling rate {rate}, meteor color {color:?}");
            Ok(Outcome::FallingRate { rate, color })
        }
        Command::Move { x, spawn_x } => {
            let (old, new) = state.character.move_to(x);
            let character = Redraw {
                old,
                new,
                color: Color::CHARACTER,
            };

            if let Some(meteor) = character_hit(&state.pool, x, state.spawn_size) {
                log::info!(
                    "Collision with meteor {} at ({}, {})",
                    meteor.id,
                    meteor.rect.x,
                    meteor.rect.y
                );
                state.phase = GamePhase::GameOver;
                return Err(ProtocolError::Collision);
            }

            let spawn = match spawn_x {
                Some(spawn_x) => try_spawn(state, spawn_x)?,
                None => Spawn::NotRequested,
            };
            Ok(Outcome::Moved { character, spawn })
        }
    }
}

fn try_spawn(state: &mut GameState, spawn_x: i32) -> Result<Spawn, ProtocolError> {
    if state.pool.is_full() {
        log::warn!("Meteor pool full, dropping spawn at x={spawn_x}");
        return Ok(Spawn::PoolFull);
    }
    if spawn_blocked(&state.pool, spawn_x, state.spawn_size) {
        log::debug!("Spawn at x={spawn_x} overlaps a falling meteor");
        return Ok(Spawn::Overlapping);
    }

    let rect = state.spawn_rect(spawn_x);
    let color = state.color.current();
    match state.pool.spawn(rect, color) {
        Ok(id) => {
            log::debug!("Spawned meteor {id} at x={spawn_x} ({} live)", state.pool.len());
            Ok(Spawn::Spawned(Meteor { id, rect, color }))
        }
        Err(PoolError::CapacityExceeded) => Ok(Spawn::PoolFull),
        Err(PoolError::OutOfMemory) => Err(ProtocolError::OutOfMemory),
    }
}
