//! Display surface rendering
//!
//! The engine never owns pixels. It borrows a `Surface` for the length of a
//! single erase/paint pair and releases it again, so the game-state lock and
//! the surface lock are never held together.

pub mod canvas;
pub mod font;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::consts::{BANNER_GLYPH_SIZE, BANNER_ORIGIN};
use crate::sim::{Color, Rect, Redraw};

pub use canvas::Canvas;
pub use font::{GAME_OVER, Glyph, glyph};

/// A drawable target: opaque filled rectangles plus bitmap glyphs
pub trait Surface: Send {
    /// Fill `rect` with `color`, clipping to the surface
    fn fill(&mut self, rect: Rect, color: Color);

    /// Draw a 5x7 glyph with its top-left cell at (`x`, `y`), each cell
    /// `scale` pixels square
    fn blit_glyph(&mut self, glyph: &Glyph, x: i32, y: i32, scale: i32, color: Color) {
        for (col, row) in glyph.lit_cells() {
            self.fill(Rect::new(x + col * scale, y + row * scale, scale, scale), color);
        }
    }
}

/// Surface shared between the tick thread and the request path
pub type SharedSurface = Arc<Mutex<dyn Surface>>;

/// Erase-then-paint synchronizer for one session
///
/// Once the end screen is painted, redraws still in flight from a tick are
/// dropped so they can't scribble over the banner.
#[derive(Clone)]
pub struct Renderer {
    surface: SharedSurface,
    halted: Arc<AtomicBool>,
}

impl Renderer {
    pub fn new(surface: SharedSurface) -> Self {
        Self {
            surface,
            halted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the end screen has been painted
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Erase `old` in the background color, then paint `new`
    pub fn redraw(&self, redraw: &Redraw) {
        let mut surface = self.surface.lock();
        if self.is_halted() {
            return;
        }
        surface.fill(redraw.old, Color::BACKGROUND);
        surface.fill(redraw.new, redraw.color);
    }

    /// Paint a single box (spawns, initial character)
    pub fn paint(&self, rect: Rect, color: Color) {
        let mut surface = self.surface.lock();
        if self.is_halted() {
            return;
        }
        surface.fill(rect, color);
    }

    /// Render `text` with the 5x7 font
    ///
    /// The pen advances 6 cells per glyph; a space widens that gap to 8.
    pub fn draw_banner(&self, text: &str, origin: (i32, i32), glyph_size: i32, color: Color) {
        let mut surface = self.surface.lock();
        draw_text(&mut *surface, text, origin, glyph_size, color);
    }

    /// Black out the field and show "GAME OVER"; later redraws become no-ops
    pub fn game_over(&self) {
        {
            let mut surface = self.surface.lock();
            self.halted.store(true, Ordering::Release);
            surface.fill(Rect::field(), Color::BACKGROUND);
        }
        // Halted redraws are dropped, so the banner can't be painted over
        self.draw_banner(GAME_OVER, BANNER_ORIGIN, BANNER_GLYPH_SIZE, Color::White);
    }
}

fn draw_text(surface: &mut dyn Surface, text: &str, origin: (i32, i32), glyph_size: i32, color: Color) {
    let (mut x, y) = origin;
    for ch in text.chars() {
        if ch == ' ' {
            x += 2 * glyph_size;
            continue;
        }
        match glyph(ch) {
            Some(g) => surface.blit_glyph(g, x, y, glyph_size, color),
            None => log::warn!("No glyph for {ch:?}"),
        }
        x += 6 * glyph_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every fill in order
    #[derive(Default)]
    struct Recorder {
        fills: Vec<(Rect, Color)>,
    }

    impl Surface for Recorder {
        fn fill(&mut self, rect: Rect, color: Color) {
            self.fills.push((rect, color));
        }
    }

    fn renderer() -> (Arc<Mutex<Recorder>>, Renderer) {
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        let renderer = Renderer::new(recorder.clone());
        (recorder, renderer)
    }

    #[test]
    fn test_redraw_erases_then_paints() {
        let (recorder, renderer) = renderer();
        let old = Rect::new(10, 0, 75, 75);
        let new = Rect::new(10, 4, 75, 75);
        renderer.redraw(&Redraw {
            old,
            new,
            color: Color::Pink,
        });

        let recorded = recorder.lock();
        assert_eq!(recorded.fills.as_slice(), &[(old, Color::Black), (new, Color::Pink)]);
    }

    #[test]
    fn test_banner_pen_advance() {
        let (recorder, renderer) = renderer();
        renderer.draw_banner("EE E", (0, 0), 1, Color::White);

        // Top row of E is fully lit, so it traces each glyph's pen position
        let mut xs: Vec<i32> = recorder
            .lock()
            .fills
            .iter()
            .filter(|(r, _)| r.y == 0)
            .map(|(r, _)| r.x)
            .collect();
        xs.sort_unstable();
        assert_eq!(xs, vec![0, 1, 2, 3, 4, 6, 7, 8, 9, 10, 14, 15, 16, 17, 18]);
    }

    #[test]
    fn test_game_over_halts_redraws() {
        let (recorder, renderer) = renderer();
        renderer.game_over();
        let painted = recorder.lock().fills.len();
        assert_eq!(recorder.lock().fills[0], (Rect::field(), Color::Black));
        assert!(renderer.is_halted());
        // Banner glyphs follow the blackout at size 10
        assert_eq!(
            recorder.lock().fills[1],
            (Rect::new(BANNER_ORIGIN.0 + 10, BANNER_ORIGIN.1, 10, 10), Color::White)
        );

        renderer.redraw(&Redraw {
            old: Rect::new(0, 0, 10, 10),
            new: Rect::new(0, 5, 10, 10),
            color: Color::Red,
        });
        renderer.paint(Rect::new(0, 0, 5, 5), Color::Red);
        assert_eq!(recorder.lock().fills.len(), painted);
    }
}
