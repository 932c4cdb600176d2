//! Text layout: turns a byte stream into characters and cursor moves.
//!
//! Bytes up to `0x1F` are control codes and never reach the display. Everything else is written
//! at the cursor, which then advances and wraps to the start of the next row (modulo the row
//! count) once a row is full. The controller's own address counter doesn't follow the row table
//! across row ends, so every wrap re-sends the DDRAM address.
//!
//! A [NEWLINE] directly after a character that wrapped the cursor is absorbed, so text already
//! broken at the display width doesn't leave empty rows behind. Any other operation on the
//! display in between (a toggle, a scroll, a cursor move) cancels that.

use super::display::Lcd;
use super::driver::HD44780Driver;
use super::state::CursorPosition;
use log::trace;

/// Clears the display and moves the cursor to `0:0`.
pub const ESCAPE: u8 = 0x1B;
/// Moves the cursor to `0:0`, keeping the content.
pub const NUL: u8 = 0x00;
/// Moves the cursor to the start of the next row, wrapping to the first one.
pub const NEWLINE: u8 = 0x0A;

const LAST_CONTROL_CODE: u8 = 0x1F;

impl<D: HD44780Driver> Lcd<D> {
    /// Writes every byte of `bytes`, NULs included.
    pub fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    /// Writes `bytes` up to the first NUL, if any.
    pub fn write_cstr(&mut self, bytes: &[u8]) {
        let end = bytes.iter().position(|&byte| byte == NUL).unwrap_or(bytes.len());
        self.write(&bytes[..end]);
    }

    fn write_byte(&mut self, byte: u8) {
        match byte {
            ESCAPE => self.clear(),
            NUL => {
                self.cursor = CursorPosition::default();
                self.wrap_pending = false;
                self.sync_cursor();
            }
            NEWLINE if self.wrap_pending => {
                trace!("Newline absorbed after wrap");
                self.wrap_pending = false;
            }
            NEWLINE => {
                self.next_row();
                self.sync_cursor();
            }
            0..=LAST_CONTROL_CODE => trace!("Ignoring control byte {byte:#04x}"),
            _ => self.wrap_pending = self.send_character(byte),
        }
    }

    /// Displays `byte` at the cursor and advances it. Returns whether the cursor wrapped to the
    /// next row.
    fn send_character(&mut self, byte: u8) -> bool {
        self.screen.put(self.cursor.col, self.cursor.row, byte);
        self.driver.send_data(byte);

        self.cursor.col = self.cursor.col.saturating_add(1);
        if self.cursor.col < self.geometry.columns() {
            return false;
        }
        self.next_row();
        self.sync_cursor();
        true
    }

    fn next_row(&mut self) {
        self.cursor.col = 0;
        self.cursor.row = (self.cursor.row + 1) % self.geometry.rows();
    }
}
