//! Device façade over the game engine
//!
//! A `Device` hands out one `Session` at a time. A session owns the game state,
//! the tick scheduler and a renderer; requests come in through `write` and the
//! end of a run is reported as a `Collision` error.
//!
//! Locking:
//! - `GameState` sits behind one mutex, held for a whole tick or request
//! - the display surface has its own mutex, taken per erase/paint pair
//! - the two are never held together

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use crate::consts::*;
use crate::renderer::{Renderer, SharedSurface};
use crate::scheduler::TickScheduler;
use crate::settings::Settings;
use crate::sim::{
    Color, GameState, Outcome, ParsePolicy, PoolError, ProtocolError, Spawn, TickReport, decode,
    dispatch, tick,
};

/// Bad file descriptor - the session was already released
const STATUS_CLOSED: isize = -9;
/// Device or resource busy
const STATUS_BUSY: isize = -16;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("a session is already open")]
    Busy,
    #[error("session has been released")]
    Closed,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("could not create game state: {0}")]
    State(#[from] PoolError),
    #[error("could not start the tick thread: {0}")]
    Scheduler(#[from] io::Error),
}

impl DeviceError {
    /// Errno-style status for the writer
    pub fn status(&self) -> isize {
        match self {
            DeviceError::Busy => STATUS_BUSY,
            DeviceError::Closed => STATUS_CLOSED,
            DeviceError::Protocol(e) => e.status(),
            DeviceError::State(_) | DeviceError::Scheduler(_) => STATUS_OUT_OF_MEMORY,
        }
    }

    /// The run ended in a collision
    pub fn is_game_over(&self) -> bool {
        matches!(self, DeviceError::Protocol(ProtocolError::Collision))
    }
}

/// The game device: settings plus a display to draw on
pub struct Device {
    settings: Settings,
    surface: SharedSurface,
    in_use: Arc<AtomicBool>,
}

impl Device {
    pub fn new(settings: Settings, surface: SharedSurface) -> Self {
        Self {
            settings,
            surface,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    /// Start a session: fresh state, character painted, ticks armed
    pub fn open(&self) -> Result<Session, DeviceError> {
        if self
            .in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DeviceError::Busy);
        }

        match Session::start(&self.settings, Arc::clone(&self.surface), Arc::clone(&self.in_use)) {
            Ok(session) => Ok(session),
            Err(e) => {
                self.in_use.store(false, Ordering::Release);
                Err(e)
            }
        }
    }
}

/// One play-through, from open to release
pub struct Session {
    state: Arc<Mutex<GameState>>,
    renderer: Renderer,
    scheduler: TickScheduler,
    policy: ParsePolicy,
    in_use: Arc<AtomicBool>,
    released: bool,
}

impl Session {
    fn start(
        settings: &Settings,
        surface: SharedSurface,
        in_use: Arc<AtomicBool>,
    ) -> Result<Self, DeviceError> {
        let state = GameState::new(settings.spawn_size, settings.falling_rate)?;
        let character = state.character.rect;
        let state = Arc::new(Mutex::new(state));
        let renderer = Renderer::new(surface);

        let mut scheduler = TickScheduler::new(settings.tick_interval());
        {
            let state = Arc::clone(&state);
            let renderer = renderer.clone();
            scheduler.arm(move || {
                run_tick(&state, &renderer);
            })?;
        }

        renderer.paint(character, Color::CHARACTER);
        log::info!("Session opened, ticking every {:?}", scheduler.interval());

        Ok(Self {
            state,
            renderer,
            scheduler,
            policy: settings.parse_policy,
            in_use,
            released: false,
        })
    }

    /// Handle one request, returning the number of bytes consumed
    pub fn write(&self, buf: &[u8]) -> Result<usize, DeviceError> {
        if self.released {
            return Err(DeviceError::Closed);
        }

        let command = decode(buf, self.policy)?;
        let outcome = {
            let mut state = self.state.lock();
            dispatch(&mut state, command)
        };

        match outcome {
            Ok(Outcome::Moved { character, spawn }) => {
                self.renderer.redraw(&character);
                if let Spawn::Spawned(meteor) = spawn {
                    self.renderer.paint(meteor.rect, meteor.color);
                }
            }
            Ok(Outcome::FallingRate { .. } | Outcome::Ignored) => {}
            Err(ProtocolError::Collision) => {
                if !self.renderer.is_halted() {
                    self.renderer.game_over();
                }
                return Err(ProtocolError::Collision.into());
            }
            Err(e) => return Err(e.into()),
        }
        Ok(buf.len())
    }

    /// Same as `write`, folded into one signed status
    pub fn write_status(&self, buf: &[u8]) -> isize {
        match self.write(buf) {
            Ok(n) => n as isize,
            Err(e) => e.status(),
        }
    }

    /// Reads carry no data; the device is write-driven
    pub fn read(&self, _buf: &mut [u8]) -> Result<usize, DeviceError> {
        if self.released {
            return Err(DeviceError::Closed);
        }
        Ok(0)
    }

    /// Run one tick now, on the caller's thread
    pub fn tick_now(&self) -> TickReport {
        run_tick(&self.state, &self.renderer)
    }

    /// Inspect or adjust the state under the session lock
    pub fn with_state<R>(&self, f: impl FnOnce(&mut GameState) -> R) -> R {
        let mut state = self.state.lock();
        f(&mut state)
    }

    pub fn is_game_over(&self) -> bool {
        self.state.lock().is_over()
    }

    pub fn is_ticking(&self) -> bool {
        self.scheduler.is_armed()
    }

    /// Tear the session down; safe to call more than once
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        // Join the tick thread before touching the state it uses
        self.scheduler.disarm();
        self.state.lock().clear();
        self.released = true;
        self.in_use.store(false, Ordering::Release);
        log::info!("Session released");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}

/// Advance under the state lock, then paint with the lock released
fn run_tick(state: &Mutex<GameState>, renderer: &Renderer) -> TickReport {
    let report = {
        let mut state = state.lock();
        tick(&mut state)
    };
    for redraw in &report.redraws {
        renderer.redraw(redraw);
    }
    report
}
