//! HD44780 command codec.
//!
//! [HD44780Driver] maps the controller's instructions to opcode bytes. Implementations only
//! provide the raw transport ([HD44780Driver::send_command], [HD44780Driver::send_data]) and the
//! reset handshake; the instruction set itself lives in the trait's provided methods.
//!
//! Transport operations return nothing. With R/W tied to ground the controller never
//! acknowledges anything, so a lost strobe can't be observed by the caller.

mod gpio;

use super::config::BusWidth;
use super::state::{DisplayControl, EntryMode, FunctionSet};
pub use gpio::*;
use std::fmt::Debug;
use std::time::Duration;

/// Execution time of clear display and return home, much longer than any other instruction.
pub const LONG_COMMAND_DELAY: Duration = Duration::from_millis(2);

pub trait HD44780Driver: Debug {
    /// Gets the width of the data bus the driver was wired with.
    fn bus_width(&self) -> BusWidth;

    /// Waits for the controller's power-on settle time and forces its interface into a known
    /// mode, no matter what state it powered up in.
    ///
    /// On a 4-bit bus, this ends with the interface in 4-bit mode, but the function register is
    /// not fully set yet: callers still have to send [HD44780Driver::function_set].
    fn synchronize(&mut self, function: FunctionSet);

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) {
        self.send_command(0b00000001);
        self.wait(LONG_COMMAND_DELAY);
    }

    /// Sets the cursor to the home position and undoes any display shift.
    fn return_home(&mut self) {
        self.send_command(0b00000010);
        self.wait(LONG_COMMAND_DELAY);
    }

    /// Sets the entry mode: cursor direction and display shift.
    fn set_entry_mode(&mut self, entry: EntryMode) {
        self.send_command(0b00000100 | entry.to_mask());
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(&mut self, control: DisplayControl) {
        self.send_command(0b00001000 | control.to_mask());
    }

    /// Moves the cursor or shifts the display, without touching DDRAM.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) {
        let mut command = 0b00010000;
        if display_shift {
            command |= 0b00001000;
        }
        if direction == CursorDirection::Right {
            command |= 0b00000100;
        }
        self.send_command(command);
    }

    /// Sets the bus width, number of lines and font.
    fn function_set(&mut self, function: FunctionSet) {
        self.send_command(0b00100000 | function.to_mask());
    }

    /// Sets the CGRAM address. Only the low 6 bits are used.
    fn set_cgram_address(&mut self, address: u8) {
        self.send_command(0b01000000 | (address & 0b00111111));
    }

    /// Sets the DDRAM address. Only the low 7 bits are used.
    fn set_ddram_address(&mut self, address: u8) {
        self.send_command(0b10000000 | (address & 0b01111111));
    }

    // Low-level operations
    // The instructions above are built on these, which are implemented by the transport.

    /// Sends a command to the HD44780 controller.
    /// Sets the RS pin to 0 (command).
    fn send_command(&mut self, command: u8);

    /// Sends data to the HD44780 controller, to DDRAM or CGRAM depending on the last address set.
    /// Sets the RS pin to 1 (data).
    fn send_data(&mut self, data: u8);

    /// Blocks for at least `duration`, for instructions that need longer than a strobe's settle time.
    fn wait(&mut self, duration: Duration);

    /// Drives every line of the bus low.
    fn shutdown(&mut self);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data, i.e. right-to-left text.
    Left,
    /// Moves the cursor to the right after writing data, i.e. left-to-right text.
    Right,
}
