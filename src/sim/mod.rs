//! Game state engine
//!
//! All gameplay rules live here. Nothing in this module touches a display or a
//! clock directly:
//! - `tick` returns the redraws it wants instead of painting
//! - `protocol` returns an `Outcome` describing what to paint
//! - Callers own locking and surface access

pub mod collision;
pub mod palette;
pub mod protocol;
pub mod state;
pub mod tick;

pub use collision::{character_hit, hit_band_top, meteor_hits_character, spawn_blocked};
pub use palette::{Color, ColorCursor, METEOR_PALETTE};
pub use protocol::{Command, Outcome, ParsePolicy, ProtocolError, Spawn, decode, dispatch};
pub use state::{Character, GamePhase, GameState, Meteor, MeteorPool, PoolError, Rect, Visit};
pub use tick::{Redraw, TickReport, tick};
