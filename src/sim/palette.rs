//! Indexed colors and the meteor palette cursor

use serde::{Deserialize, Serialize};

/// 8-bit indexed palette entries understood by the display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    Black = 0x00,
    Blue = 0x01,
    Green = 0x02,
    Red = 0x04,
    LightBlue = 0x09,
    LightGreen = 0x0A,
    Pink = 0x0D,
    Yellow = 0x0E,
    White = 0x0F,
}

impl Color {
    /// Background color used to erase
    pub const BACKGROUND: Color = Color::Black;
    /// Character fill
    pub const CHARACTER: Color = Color::LightBlue;

    /// Raw palette index
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Meteor colors, cycled on every difficulty update
pub const METEOR_PALETTE: [Color; 7] = [
    Color::Blue,
    Color::White,
    Color::Red,
    Color::Green,
    Color::Pink,
    Color::Yellow,
    Color::LightGreen,
];

/// Cyclic position in `METEOR_PALETTE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCursor {
    index: usize,
}

impl ColorCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Color new meteors are spawned with
    pub fn current(&self) -> Color {
        METEOR_PALETTE[self.index]
    }

    /// Step to the next palette entry, wrapping past the last one
    pub fn advance(&mut self) -> Color {
        self.index = (self.index + 1) % METEOR_PALETTE.len();
        self.current()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}
