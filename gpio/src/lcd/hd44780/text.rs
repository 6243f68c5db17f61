//! Text output on top of the raw instruction set.
use crate::lcd::hd44780::driver::HD44780Driver;
use crate::lcd::hd44780::LcdResult;
use log::warn;
use std::iter;

/// Number of custom glyph slots in CGRAM, shown as character codes `0..8`.
pub const GLYPH_SLOTS: u8 = 8;

/// Maps a character to the code the controller displays for it.
///
/// ASCII is passed through, anything else becomes `'?'`.
pub fn char_code(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        warn!("Non-ASCII character: {}", c);
        b'?'
    }
}

pub trait TextExt {
    /// Rewrites a whole row: `start_col` spaces, then `text`, then spaces up to the row width.
    ///
    /// Text that doesn't fit is cut off at the end of the row.
    fn write_line(&mut self, text: &str, row: u8, start_col: u8) -> LcdResult<()>;

    /// Writes `text` at the cursor as is. Newlines are skipped.
    fn write_stream(&mut self, text: &str) -> LcdResult<()>;

    /// Redraws the whole screen with `text`, starting at the top left.
    ///
    /// Newlines end the current row, full rows wrap onto the next one, and everything not covered
    /// by the text is cleared. Text past the last row is dropped.
    fn refresh_multiline(&mut self, text: &str) -> LcdResult<()>;

    /// Loads a 5x8 glyph into one of the 8 CGRAM slots. The low 5 bits of each byte are one row
    /// of pixels, top to bottom.
    ///
    /// Leaves the address counter in CGRAM, so the cursor has to be positioned before writing
    /// text again.
    fn write_glyph(&mut self, slot: u8, bitmap: &[u8; 8]) -> LcdResult<()>;
}

impl<T: ?Sized + HD44780Driver> TextExt for T {
    fn write_line(&mut self, text: &str, row: u8, start_col: u8) -> LcdResult<()> {
        let cols = self.geometry().cols() as usize;
        self.set_position(row, 0)?;

        let codes = iter::repeat_n(b' ', start_col as usize)
            .chain(text.chars().map(char_code))
            .chain(iter::repeat(b' '))
            .take(cols);
        for code in codes {
            self.write_byte(code)?;
        }
        Ok(())
    }

    fn write_stream(&mut self, text: &str) -> LcdResult<()> {
        for c in text.chars().filter(|&c| c != '\n') {
            self.write_byte(char_code(c))?;
        }
        Ok(())
    }

    fn refresh_multiline(&mut self, text: &str) -> LcdResult<()> {
        let geometry = self.geometry();
        let (rows, cols) = (geometry.rows(), geometry.cols());

        let mut row = 0;
        let mut col = 0;
        self.set_position(row, col)?;

        for c in text.chars() {
            if col == cols {
                row += 1;
                col = 0;
                if row == rows {
                    break;
                }
                self.set_position(row, 0)?;
            }

            if c == '\n' {
                for _ in col..cols {
                    self.write_byte(b' ')?;
                }
                row += 1;
                col = 0;
                if row == rows {
                    break;
                }
                self.set_position(row, 0)?;
                continue;
            }

            self.write_byte(char_code(c))?;
            col += 1;
        }

        if row < rows {
            for _ in col..cols {
                self.write_byte(b' ')?;
            }
            for row in row + 1..rows {
                self.write_line("", row, 0)?;
            }
        }
        Ok(())
    }

    fn write_glyph(&mut self, slot: u8, bitmap: &[u8; 8]) -> LcdResult<()> {
        if slot >= GLYPH_SLOTS {
            warn!("Ignoring glyph for slot {}, only {} slots exist", slot, GLYPH_SLOTS);
            return Ok(());
        }

        self.set_cgram_address(slot * 8)?;
        for &line in bitmap {
            self.write_byte(line)?;
        }
        Ok(())
    }
}
