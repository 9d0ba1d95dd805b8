//! Fixed-interval simulation tick
//!
//! Advances every meteor by the falling rate and evicts the ones that left the
//! play field. Painting is left to the caller so the state lock can be dropped
//! before the display surface is touched.

use super::palette::Color;
use super::state::{GameState, Meteor, Rect, Visit};
use crate::consts::FIELD_HEIGHT;

/// One erase-then-paint pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redraw {
    pub old: Rect,
    pub new: Rect,
    pub color: Color,
}

/// Everything a single tick changed
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// One entry per meteor alive at the start of the tick, in spawn order
    pub redraws: Vec<Redraw>,
    /// Meteors that fell past the field this tick
    pub evicted: Vec<Meteor>,
}

/// Advance the game state by one tick
pub fn tick(state: &mut GameState) -> TickReport {
    // Nothing moves once the banner is up
    if state.is_over() {
        return TickReport::default();
    }

    state.time_ticks += 1;
    let rate = state.falling_rate;

    let mut redraws = Vec::with_capacity(state.pool.len());
    let evicted = state.pool.for_each_mut(|meteor| {
        let next = meteor.rect.dropped(rate);
        redraws.push(Redraw {
            old: meteor.rect,
            new: next,
            color: meteor.color,
        });
        meteor.rect = next;

        if meteor.rect.y > FIELD_HEIGHT {
            Visit::Evict
        } else {
            Visit::Keep
        }
    });

    for meteor in &evicted {
        log::debug!("Evicted meteor {} at y={}", meteor.id, meteor.rect.y);
    }

    TickReport { redraws, evicted }
}
