//! 5x7 monochrome glyphs for the end-of-game banner

/// Banner shown when the character is hit
pub const GAME_OVER: &str = "GAME OVER";

pub const GLYPH_WIDTH: i32 = 5;
pub const GLYPH_HEIGHT: i32 = 7;

/// One character; each row uses the low 5 bits, MSB on the left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub rows: [u8; 7],
}

impl Glyph {
    pub fn is_lit(&self, col: i32, row: i32) -> bool {
        if !(0..GLYPH_WIDTH).contains(&col) || !(0..GLYPH_HEIGHT).contains(&row) {
            return false;
        }
        self.rows[row as usize] & (1 << (GLYPH_WIDTH - 1 - col)) != 0
    }

    /// (col, row) of every lit cell, row-major
    pub fn lit_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..GLYPH_HEIGHT)
            .flat_map(|row| (0..GLYPH_WIDTH).map(move |col| (col, row)))
            .filter(|&(col, row)| self.is_lit(col, row))
    }
}

const FONT: [Glyph; 7] = [
    Glyph {
        ch: 'G',
        rows: [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
    },
    Glyph {
        ch: 'A',
        rows: [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
    },
    Glyph {
        ch: 'M',
        rows: [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
    },
    Glyph {
        ch: 'E',
        rows: [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
    },
    Glyph {
        ch: 'O',
        rows: [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
    },
    Glyph {
        ch: 'V',
        rows: [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
    },
    Glyph {
        ch: 'R',
        rows: [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
    },
];

/// Look up a glyph (case-insensitive)
pub fn glyph(ch: char) -> Option<&'static Glyph> {
    let ch = ch.to_ascii_uppercase();
    FONT.iter().find(|g| g.ch == ch)
}
