use super::config::{Font, Geometry};
use super::driver::{CursorDirection, HD44780Driver};
use super::screen::Screen;
use super::state::{ControlState, CursorPosition, DisplayControl, EntryMode, FunctionSet};
use log::{debug, info};

/// An initialized HD44780 display.
///
/// Owns the driver and every piece of state the controller can't report back: the control
/// register mirrors, the cursor position and the screen content. All operations take `&mut self`,
/// so there is exactly one writer per display.
#[derive(Debug)]
pub struct Lcd<D: HD44780Driver> {
    pub(super) driver: D,
    pub(super) geometry: Geometry,
    pub(super) control: ControlState,
    pub(super) cursor: CursorPosition,
    /// Set right after a character wrapped the cursor to a new row.
    pub(super) wrap_pending: bool,
    pub(super) screen: Screen,
}

impl<D: HD44780Driver> Lcd<D> {
    /// Brings the display up.
    ///
    /// Runs the driver's reset handshake, then sets the final function register, turns the display
    /// on with cursor and blink off, clears it, and selects left-to-right entry without autoscroll.
    pub fn initialize(mut driver: D, geometry: Geometry) -> Self {
        let font = match geometry.font() {
            Font::Dots5x10 if geometry.rows() > 1 => {
                info!("5x10 font needs a single-row display, using 5x8");
                Font::Dots5x8
            }
            font => font,
        };
        let function = FunctionSet {
            bus_width: driver.bus_width(),
            two_lines: geometry.rows() > 1,
            font,
        };
        debug!(
            "Initializing {}x{} LCD with {:?}",
            geometry.columns(),
            geometry.rows(),
            function
        );

        driver.synchronize(function);
        driver.function_set(function);

        let display = DisplayControl::default();
        driver.set_display_control(display);
        driver.clear_display();

        let entry = EntryMode::default();
        driver.set_entry_mode(entry);

        Lcd {
            driver,
            geometry,
            control: ControlState {
                function,
                display,
                entry,
            },
            cursor: CursorPosition::default(),
            wrap_pending: false,
            screen: Screen::new(&geometry),
        }
    }

    /// Clears the display, drives every line low and releases the driver.
    pub fn uninitialize(mut self) {
        self.clear();
        self.driver.shutdown();
        info!("LCD uninitialized");
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn control_state(&self) -> &ControlState {
        &self.control
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Clears the display and moves the cursor to `0:0`.
    pub fn clear(&mut self) {
        self.driver.clear_display();
        self.screen.clear();
        self.cursor = CursorPosition::default();
        self.wrap_pending = false;
    }

    /// Moves the cursor to `0:0` and undoes any display shift, keeping the content.
    pub fn home(&mut self) {
        self.driver.return_home();
        self.cursor = CursorPosition::default();
        self.wrap_pending = false;
    }

    // Display control register

    fn update_display_control(&mut self, update: impl FnOnce(&mut DisplayControl)) {
        update(&mut self.control.display);
        self.wrap_pending = false;
        self.driver.set_display_control(self.control.display);
    }

    pub fn set_display(&mut self, on: bool) {
        self.update_display_control(|display| display.display_on = on);
    }

    pub fn is_display_on(&self) -> bool {
        self.control.display.display_on
    }

    /// Shows or hides the underline cursor.
    pub fn set_cursor_visible(&mut self, on: bool) {
        self.update_display_control(|display| display.cursor_on = on);
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.control.display.cursor_on
    }

    pub fn set_blink(&mut self, on: bool) {
        self.update_display_control(|display| display.blink_on = on);
    }

    pub fn is_blink_on(&self) -> bool {
        self.control.display.blink_on
    }

    // Entry mode register

    fn update_entry_mode(&mut self, update: impl FnOnce(&mut EntryMode)) {
        update(&mut self.control.entry);
        self.wrap_pending = false;
        self.driver.set_entry_mode(self.control.entry);
    }

    /// Sets where the cursor moves after each character: [CursorDirection::Right] for
    /// left-to-right text.
    pub fn set_text_direction(&mut self, direction: CursorDirection) {
        self.update_entry_mode(|entry| entry.direction = direction);
    }

    pub fn text_direction(&self) -> CursorDirection {
        self.control.entry.direction
    }

    pub fn is_left_to_right(&self) -> bool {
        self.control.entry.direction == CursorDirection::Right
    }

    /// Shifts the whole display on every character instead of moving the cursor.
    pub fn set_autoscroll(&mut self, on: bool) {
        self.update_entry_mode(|entry| entry.autoscroll = on);
    }

    pub fn is_autoscroll(&self) -> bool {
        self.control.entry.autoscroll
    }

    /// Shifts the display content by one column, without changing DDRAM or the cursor mirror.
    pub fn scroll_display(&mut self, direction: CursorDirection) {
        self.wrap_pending = false;
        self.driver.cursor_shift(true, direction);
    }

    // Cursor

    /// Moves the cursor. A row past the last one is clamped to the last row; the column is used
    /// as given.
    pub fn set_cursor_position(&mut self, col: u8, row: u8) {
        let row = row.min(self.geometry.rows() - 1);
        self.cursor = CursorPosition::new(col, row);
        self.wrap_pending = false;
        self.sync_cursor();
    }

    pub fn cursor_position(&self) -> CursorPosition {
        self.cursor
    }

    /// Points the controller's address counter at the cursor mirror.
    pub(super) fn sync_cursor(&mut self) {
        let address = self.geometry.address(self.cursor.col, self.cursor.row);
        self.driver.set_ddram_address(address);
    }

    /// Stores a custom glyph in one of the 8 CGRAM slots. It is then displayed by writing the
    /// slot number (`0..=7`) as a character.
    ///
    /// Each row of `charmap` holds 5 pixels in its low bits, top row first.
    pub fn create_char(&mut self, location: u8, charmap: [u8; 8]) {
        let location = location & 0x7;
        self.wrap_pending = false;
        self.driver.set_cgram_address(location << 3);
        for row in charmap {
            self.driver.send_data(row);
        }
        // Data writes go to CGRAM until a DDRAM address is set again
        self.sync_cursor();
    }
}
