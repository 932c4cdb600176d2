//! Bring-up parameters: how the display is wired and how big it is.
//!
//! Both are fixed once the display is initialized.

use crate::{GpioActiveLevel, GpioError, GpioResult};

/// Width of the data bus between the host and the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BusWidth {
    /// Only D4..D7 are wired; every byte takes two transfers, high nibble first.
    Four,
    /// D0..D7 are wired.
    Eight,
}

/// Data line numbers, ordered from D0 (or D4 on a 4-bit bus) upwards.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DataPins {
    FourBit([usize; 4]),
    EightBit([usize; 8]),
}

/// GPIO wiring of the display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BusConfig {
    /// Register select line (low: command, high: character data).
    pub rs: usize,
    /// Read/write line. `None` when R/W is tied to ground, which makes the bus write-only.
    pub rw: Option<usize>,
    /// Enable (strobe) line.
    pub enable: usize,
    pub data: DataPins,
    /// Active level applied to every line, [GpioActiveLevel::Low] for inverting level shifters.
    pub active_level: GpioActiveLevel,
}

impl BusConfig {
    pub fn new_4bit(rs: usize, rw: Option<usize>, enable: usize, data: [usize; 4]) -> Self {
        BusConfig {
            rs,
            rw,
            enable,
            data: DataPins::FourBit(data),
            active_level: GpioActiveLevel::High,
        }
    }

    pub fn new_8bit(rs: usize, rw: Option<usize>, enable: usize, data: [usize; 8]) -> Self {
        BusConfig {
            rs,
            rw,
            enable,
            data: DataPins::EightBit(data),
            active_level: GpioActiveLevel::High,
        }
    }

    pub fn with_active_level(mut self, level: GpioActiveLevel) -> Self {
        self.active_level = level;
        self
    }

    pub fn width(&self) -> BusWidth {
        match self.data {
            DataPins::FourBit(_) => BusWidth::Four,
            DataPins::EightBit(_) => BusWidth::Eight,
        }
    }
}

/// Character cell size.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Font {
    #[default]
    Dots5x8,
    /// Only available on single-row displays.
    Dots5x10,
}

/// Visible size of the display and the DDRAM address each row starts at.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Geometry {
    columns: u8,
    rows: u8,
    font: Font,
    row_offsets: [u8; 4],
}

impl Geometry {
    pub const MAX_COLUMNS: u8 = 40;
    pub const MAX_ROWS: u8 = 4;

    /// Creates the geometry of a `columns` x `rows` display.
    ///
    /// Rows 2 and 3 of a 4-row module are continuations of rows 0 and 1 in DDRAM, so the row
    /// table is `0x00`, `0x40`, `columns`, `0x40 + columns` rather than a linear layout.
    ///
    /// # Errors
    /// `GpioError::InvalidArgument` unless `columns` is in `1..=40` and `rows` in `1..=4`.
    pub fn new(columns: u8, rows: u8) -> GpioResult<Self> {
        if !(1..=Self::MAX_COLUMNS).contains(&columns) || !(1..=Self::MAX_ROWS).contains(&rows) {
            return Err(GpioError::InvalidArgument);
        }
        Ok(Geometry {
            columns,
            rows,
            font: Font::default(),
            row_offsets: [0x00, 0x40, columns, 0x40 + columns],
        })
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn font(&self) -> Font {
        self.font
    }

    /// Gets the DDRAM address of the first cell of `row`, clamped to the last row.
    pub fn row_offset(&self, row: u8) -> u8 {
        self.row_offsets[row.min(self.rows - 1) as usize]
    }

    /// Gets the DDRAM address of the cell at `col`, `row`.
    pub fn address(&self, col: u8, row: u8) -> u8 {
        col.wrapping_add(self.row_offset(row))
    }
}
