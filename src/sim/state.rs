//! Game state and core simulation types
//!
//! Everything the tick thread and the request handler share lives in
//! `GameState`, which callers guard with a single lock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::palette::{Color, ColorCursor};
use crate::consts::*;

/// Axis-aligned pixel box; `y` grows downward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same box shifted down by `dy`, pinned at the i32 range
    pub fn dropped(self, dy: i32) -> Self {
        Self {
            y: self.y.saturating_add(dy),
            ..self
        }
    }

    /// Whole visible play field
    pub const fn field() -> Self {
        Self::new(0, 0, FIELD_WIDTH, FIELD_HEIGHT)
    }
}

/// Errors from the meteor pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("meteor pool is full")]
    CapacityExceeded,
    #[error("could not reserve storage for a meteor")]
    OutOfMemory,
}

/// A falling obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meteor {
    pub id: u32,
    pub rect: Rect,
    /// Captured at spawn so difficulty changes don't recolor live meteors
    pub color: Color,
}

/// What a pool visitor wants done with the meteor it just saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Keep,
    Evict,
}

/// Fixed-capacity, gap-free meteor list in spawn order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteorPool {
    meteors: Vec<Meteor>,
    next_id: u32,
}

impl MeteorPool {
    /// Reserve the whole pool up front so spawns never allocate
    pub fn new() -> Result<Self, PoolError> {
        let mut meteors = Vec::new();
        meteors
            .try_reserve_exact(MAX_METEORS)
            .map_err(|_| PoolError::OutOfMemory)?;
        Ok(Self {
            meteors,
            next_id: 1,
        })
    }

    pub fn len(&self) -> usize {
        self.meteors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meteors.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.meteors.len() >= MAX_METEORS
    }

    pub fn get(&self, index: usize) -> Option<&Meteor> {
        self.meteors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Meteor> {
        self.meteors.iter()
    }

    /// Append a meteor, returning its id
    ///
    /// Nothing is drawn here; painting the new meteor is the caller's job.
    pub fn spawn(&mut self, rect: Rect, color: Color) -> Result<u32, PoolError> {
        if self.is_full() {
            return Err(PoolError::CapacityExceeded);
        }
        // No-op while the up-front reservation holds
        self.meteors
            .try_reserve(1)
            .map_err(|_| PoolError::OutOfMemory)?;

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.meteors.push(Meteor { id, rect, color });
        Ok(id)
    }

    /// Remove the meteor at `index`, shifting later meteors left by one
    ///
    /// Panics if `index` is out of range; callers only pass indices they just read.
    pub fn remove_at(&mut self, index: usize) -> Meteor {
        debug_assert!(index < self.meteors.len(), "remove_at({index}) out of range");
        self.meteors.remove(index)
    }

    /// Visit every meteor in spawn order, evicting those the visitor rejects
    ///
    /// The cursor stays put after an eviction because compaction moved the next
    /// meteor into the current slot. Returns the evicted meteors in visit order.
    pub fn for_each_mut<F>(&mut self, mut visit: F) -> Vec<Meteor>
    where
        F: FnMut(&mut Meteor) -> Visit,
    {
        let mut evicted = Vec::new();
        let mut i = 0;
        while i < self.meteors.len() {
            match visit(&mut self.meteors[i]) {
                Visit::Keep => i += 1,
                Visit::Evict => evicted.push(self.remove_at(i)),
            }
        }
        evicted
    }

    /// Drop every meteor (session teardown)
    pub fn clear(&mut self) {
        self.meteors.clear();
    }
}

/// The player's box - fixed row, movable column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub rect: Rect,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            rect: Rect::new(CHARACTER_START_X, CHARACTER_Y, CHARACTER_SIZE, CHARACTER_SIZE),
        }
    }
}

impl Character {
    pub fn x(&self) -> i32 {
        self.rect.x
    }

    /// Move to column `x`, returning the (old, new) boxes for redraw
    pub fn move_to(&mut self, x: i32) -> (Rect, Rect) {
        let old = self.rect;
        self.rect = Rect::new(x, CHARACTER_Y, CHARACTER_SIZE, CHARACTER_SIZE);
        (old, self.rect)
    }
}

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ticks advance meteors, requests move the character
    Playing,
    /// A collision ended the run; the banner owns the screen
    GameOver,
}

/// Complete per-session game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub pool: MeteorPool,
    pub character: Character,
    /// Pixels added to every meteor's y per tick
    pub falling_rate: i32,
    /// Palette position for newly spawned meteors
    pub color: ColorCursor,
    /// Meteor width/height and hit-box size
    pub spawn_size: i32,
    pub phase: GamePhase,
    /// Ticks applied since the session opened
    pub time_ticks: u64,
}

impl GameState {
    pub fn new(spawn_size: i32, falling_rate: i32) -> Result<Self, PoolError> {
        Ok(Self {
            pool: MeteorPool::new()?,
            character: Character::default(),
            falling_rate,
            color: ColorCursor::default(),
            spawn_size,
            phase: GamePhase::Playing,
            time_ticks: 0,
        })
    }

    /// Box a meteor spawned at column `x` occupies
    pub fn spawn_rect(&self, x: i32) -> Rect {
        Rect::new(x, 0, self.spawn_size, self.spawn_size)
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Free all meteors and rewind the palette (session teardown)
    pub fn clear(&mut self) {
        self.pool.clear();
        self.color.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rect_at(x: i32, y: i32) -> Rect {
        Rect::new(x, y, DEFAULT_SPAWN_SIZE, DEFAULT_SPAWN_SIZE)
    }

    #[test]
    fn test_spawn_until_full() {
        let mut pool = MeteorPool::new().unwrap();
        for i in 0..MAX_METEORS {
            assert!(pool.spawn(rect_at(i as i32, 0), Color::Red).is_ok());
        }
        assert!(pool.is_full());
        assert_eq!(
            pool.spawn(rect_at(0, 0), Color::Red),
            Err(PoolError::CapacityExceeded)
        );
        assert_eq!(pool.len(), MAX_METEORS);
    }

    #[test]
    fn test_remove_compacts_in_order() {
        let mut pool = MeteorPool::new().unwrap();
        let a = pool.spawn(rect_at(10, 0), Color::Blue).unwrap();
        let b = pool.spawn(rect_at(20, 0), Color::Blue).unwrap();
        let c = pool.spawn(rect_at(30, 0), Color::Blue).unwrap();

        let removed = pool.remove_at(1);
        assert_eq!(removed.id, b);
        let ids: Vec<u32> = pool.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_for_each_mut_evicts_adjacent() {
        // Two evictions in a row must not skip the meteor after them
        let mut pool = MeteorPool::new().unwrap();
        for x in [1, 2, 3, 4] {
            pool.spawn(rect_at(x, 0), Color::Blue).unwrap();
        }
        let mut seen = Vec::new();
        let evicted = pool.for_each_mut(|m| {
            seen.push(m.rect.x);
            if m.rect.x == 2 || m.rect.x == 3 {
                Visit::Evict
            } else {
                Visit::Keep
            }
        });
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_eq!(evicted.len(), 2);
        let left: Vec<i32> = pool.iter().map(|m| m.rect.x).collect();
        assert_eq!(left, vec![1, 4]);
    }

    #[test]
    fn test_character_move() {
        let mut character = Character::default();
        let (old, new) = character.move_to(300);
        assert_eq!(old.x, CHARACTER_START_X);
        assert_eq!(new, Rect::new(300, CHARACTER_Y, CHARACTER_SIZE, CHARACTER_SIZE));
        assert_eq!(character.x(), 300);
    }

    #[test]
    fn test_clear_resets_palette() {
        let mut state = GameState::new(DEFAULT_SPAWN_SIZE, DEFAULT_FALLING_RATE).unwrap();
        state.color.advance();
        state.pool.spawn(state.spawn_rect(100), Color::White).unwrap();
        state.clear();
        assert!(state.pool.is_empty());
        assert_eq!(state.color.index(), 0);
    }

    proptest! {
        #[test]
        fn prop_pool_never_exceeds_capacity(xs in proptest::collection::vec(0i32..500, 0..80)) {
            let mut pool = MeteorPool::new().unwrap();
            for x in xs {
                let before = pool.len();
                match pool.spawn(rect_at(x, 0), Color::Blue) {
                    Ok(_) => prop_assert_eq!(pool.len(), before + 1),
                    Err(e) => {
                        prop_assert_eq!(e, PoolError::CapacityExceeded);
                        prop_assert_eq!(pool.len(), before);
                    }
                }
                prop_assert!(pool.len() <= MAX_METEORS);
            }
        }

        #[test]
        fn prop_eviction_preserves_relative_order(
            keep in proptest::collection::vec(any::<bool>(), 0..MAX_METEORS)
        ) {
            let mut pool = MeteorPool::new().unwrap();
            for i in 0..keep.len() {
                pool.spawn(rect_at(i as i32, 0), Color::Blue).unwrap();
            }
            pool.for_each_mut(|m| {
                if keep[m.rect.x as usize] { Visit::Keep } else { Visit::Evict }
            });
            let expected: Vec<i32> = (0..keep.len() as i32).filter(|&i| keep[i as usize]).collect();
            let left: Vec<i32> = pool.iter().map(|m| m.rect.x).collect();
            prop_assert_eq!(left, expected);
        }
    }
}
