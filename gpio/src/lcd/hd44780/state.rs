//! Mirrors of the controller's control registers and of its cursor.
//!
//! The controller can't be read back over a write-only bus, so these mirrors are the only record
//! of what the display is doing. [super::Lcd] updates a mirror and sends the matching command in
//! one step.

use super::config::{BusWidth, Font};
use super::driver::CursorDirection;

/// The function register: bus width, line count and font.
///
/// Written during bring-up only.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FunctionSet {
    pub bus_width: BusWidth,
    /// Two-line mode. Set for any display with more than one row, 4-row modules included.
    pub two_lines: bool,
    pub font: Font,
}

impl FunctionSet {
    /// Converts the register to the flag bits of a function set command.
    pub fn to_mask(&self) -> u8 {
        let mut mask = 0;
        if self.bus_width == BusWidth::Eight {
            mask |= 0b00010000;
        }
        if self.two_lines {
            mask |= 0b00001000;
        }
        if self.font == Font::Dots5x10 {
            mask |= 0b00000100;
        }
        mask
    }
}

/// The display control register.
///
/// Defaults to display on, cursor off, blink off.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DisplayControl {
    pub display_on: bool,
    pub cursor_on: bool,
    pub blink_on: bool,
}

impl Default for DisplayControl {
    fn default() -> Self {
        DisplayControl {
            display_on: true,
            cursor_on: false,
            blink_on: false,
        }
    }
}

impl DisplayControl {
    /// Converts the register to the flag bits of a display control command.
    pub fn to_mask(&self) -> u8 {
        let mut mask = 0;
        if self.display_on {
            mask |= 0b00000100;
        }
        if self.cursor_on {
            mask |= 0b00000010;
        }
        if self.blink_on {
            mask |= 0b00000001;
        }
        mask
    }
}

/// The entry mode register.
///
/// Defaults to left-to-right text (the cursor moves right) without autoscroll.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EntryMode {
    /// Where the cursor moves after a character is written.
    pub direction: CursorDirection,
    /// Shift the whole display instead of moving the cursor.
    pub autoscroll: bool,
}

impl Default for EntryMode {
    fn default() -> Self {
        EntryMode {
            direction: CursorDirection::Right,
            autoscroll: false,
        }
    }
}

impl EntryMode {
    /// Converts the register to the flag bits of an entry mode set command.
    pub fn to_mask(&self) -> u8 {
        let mut mask = 0;
        if self.direction == CursorDirection::Right {
            mask |= 0b00000010;
        }
        if self.autoscroll {
            mask |= 0b00000001;
        }
        mask
    }
}

/// All three register mirrors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControlState {
    pub function: FunctionSet,
    pub display: DisplayControl,
    pub entry: EntryMode,
}

/// Zero-based cursor coordinates.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CursorPosition {
    pub col: u8,
    pub row: u8,
}

impl CursorPosition {
    pub fn new(col: u8, row: u8) -> Self {
        CursorPosition { col, row }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_bring_up_state() {
        assert_eq!(DisplayControl::default().to_mask(), 0b100);
        assert_eq!(EntryMode::default().to_mask(), 0b10);
    }

    #[test]
    fn function_mask() {
        let function = FunctionSet {
            bus_width: BusWidth::Four,
            two_lines: true,
            font: Font::Dots5x8,
        };
        assert_eq!(function.to_mask(), 0b01000);

        let function = FunctionSet {
            bus_width: BusWidth::Eight,
            two_lines: false,
            font: Font::Dots5x10,
        };
        assert_eq!(function.to_mask(), 0b10100);
    }

    #[test]
    fn entry_mask() {
        let entry = EntryMode {
            direction: CursorDirection::Left,
            autoscroll: true,
        };
        assert_eq!(entry.to_mask(), 0b01);
    }
}
