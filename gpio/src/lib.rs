//! GPIO line abstraction and the HD44780 character LCD driver built on top of it.
//!
//! Lines are requested from a [GpioDriver] backend as outputs and are owned by the returned
//! handle until it is dropped. The LCD core in [lcd::hd44780] only ever writes to the bus.

pub mod gpiod;
pub mod lcd;
pub mod mock;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO lines available.
    fn count(&self) -> GpioResult<usize>;

    /// Requests the GPIO line at the given index as an output driven to logic-low.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the index is out of range.
    /// - `GpioError::AlreadyInUse` if the line is already owned by another handle.
    fn get_output(
        &self,
        index: usize,
        level: GpioActiveLevel,
    ) -> GpioResult<Box<dyn GpioOutput + '_>>;

    /// Requests the GPIO lines at the given indices as an output bus driven to logic-low.
    ///
    /// Either all lines are acquired or none is.
    fn get_output_bus<const N: usize>(
        &self,
        indices: [usize; N],
        level: GpioActiveLevel,
    ) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>>;
}

/// Specifies the active level of the GPIO line.
///
/// By default, the active level is high. Use [GpioActiveLevel::Low] when the lines go through an
/// inverting level shifter.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioActiveLevel {
    #[default]
    High,
    Low,
}

impl GpioActiveLevel {
    /// Gets the real state that will be outputted on the GPIO line based on the active level and the value.
    pub fn get_state(&self, value: bool) -> bool {
        match self {
            GpioActiveLevel::High => value,
            GpioActiveLevel::Low => !value,
        }
    }
}

pub trait GpioOutput: Debug {
    /// Writes the logical state of the GPIO line.
    fn write(&self, value: bool) -> GpioResult<()>;
}

pub trait GpioBusOutput<const N: usize>: Debug {
    fn write(&self, values: &[bool; N]) -> GpioResult<()>;
}

impl dyn GpioBusOutput<8> + '_ {
    /// Writes the values to the GPIO lines in the bus.
    /// The values are written as a byte, LSb first.
    pub fn write_byte(&self, value: u8) -> GpioResult<()> {
        let mut values = [false; 8];
        for (i, bit) in values.iter_mut().enumerate() {
            *bit = (value & (1 << i)) != 0;
        }
        self.write(&values)
    }
}

impl dyn GpioBusOutput<4> + '_ {
    /// Writes the values to the GPIO lines in the bus.
    /// The values are written as a nibble, LSb first.
    pub fn write_nibble(&self, value: u8) -> GpioResult<()> {
        if value > 0b1111 {
            return Err(GpioError::InvalidArgument);
        }

        let mut values = [false; 4];
        for (i, bit) in values.iter_mut().enumerate() {
            *bit = (value & (1 << i)) != 0;
        }
        self.write(&values)
    }
}
