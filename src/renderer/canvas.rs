//! In-memory indexed framebuffer

use super::Surface;
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};
use crate::sim::{Color, Rect};

/// One byte per pixel, palette-indexed, row-major
#[derive(Debug, Clone)]
pub struct Canvas {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
    /// Fills issued since creation (clipped ones included)
    fills: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(FIELD_WIDTH, FIELD_HEIGHT)
    }
}

impl Canvas {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            pixels: vec![Color::BACKGROUND.index(); (width * height) as usize],
            fills: 0,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn fill_count(&self) -> u64 {
        self.fills
    }

    /// Palette index at (`x`, `y`), `None` off-canvas
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Count pixels holding `color`
    pub fn count(&self, color: Color) -> usize {
        self.pixels.iter().filter(|&&p| p == color.index()).count()
    }

    /// Downsample to text, one char per `cell` x `cell` block
    ///
    /// A block prints `#` if any of its pixels is not background.
    pub fn ascii(&self, cell: i32) -> String {
        let cell = cell.max(1);
        let mut out = String::new();
        for by in (0..self.height).step_by(cell as usize) {
            for bx in (0..self.width).step_by(cell as usize) {
                let lit = (by..(by + cell).min(self.height)).any(|y| {
                    (bx..(bx + cell).min(self.width))
                        .any(|x| self.pixel(x, y) != Some(Color::BACKGROUND.index()))
                });
                out.push(if lit { '#' } else { ' ' });
            }
            out.push('\n');
        }
        out
    }
}

impl Surface for Canvas {
    fn fill(&mut self, rect: Rect, color: Color) {
        self.fills += 1;

        let x0 = rect.x.clamp(0, self.width);
        let y0 = rect.y.clamp(0, self.height);
        let x1 = rect.x.saturating_add(rect.width).clamp(0, self.width);
        let y1 = rect.y.saturating_add(rect.height).clamp(0, self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let index = color.index();
        for y in y0..y1 {
            let row = (y * self.width) as usize;
            self.pixels[row + x0 as usize..row + x1 as usize].fill(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_clips() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill(Rect::new(8, 8, 5, 5), Color::Red);
        assert_eq!(canvas.count(Color::Red), 4);
        assert_eq!(canvas.pixel(9, 9), Some(Color::Red.index()));
        assert_eq!(canvas.pixel(10, 10), None);

        // Entirely off-canvas
        canvas.fill(Rect::new(-20, 0, 5, 5), Color::Blue);
        assert_eq!(canvas.count(Color::Blue), 0);
        assert_eq!(canvas.fill_count(), 2);
    }

    #[test]
    fn test_ascii_dump() {
        let mut canvas = Canvas::new(4, 2);
        canvas.fill(Rect::new(0, 0, 2, 2), Color::White);
        assert_eq!(canvas.ascii(2), "# \n");
    }
}
