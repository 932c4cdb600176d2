//! HD44780 character LCD module.
//!
//! The module is layered bottom-up:
//!
//! - [driver::GpioHD44780Driver] is the signal transport. It turns a byte (or a nibble on a 4-bit
//!   bus) into a timed enable strobe on the GPIO lines, and runs the controller's reset handshake.
//! - [driver::HD44780Driver] is the command codec. It maps controller operations to opcode bytes
//!   and sends them in command or data mode.
//! - [Lcd] owns the driver together with the display state: the mirrors of the three control
//!   registers, the cursor position and a mirror of the screen content. It performs bring-up,
//!   teardown, every toggle, and the text layout of arbitrary byte streams.
//!
//! The bus is write-only. Every query is answered from the mirrors in [Lcd], never by reading the
//! controller back, and a GPIO write that fails cannot be detected by the caller.

pub mod config;
pub mod driver;
mod display;
mod layout;
mod screen;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::{BusConfig, BusWidth, DataPins, Font, Geometry};
pub use display::Lcd;
pub use layout::{ESCAPE, NEWLINE, NUL};
pub use screen::Screen;
pub use state::{ControlState, CursorPosition, DisplayControl, EntryMode, FunctionSet};

use crate::{GpioDriver, GpioResult};
use driver::GpioHD44780Driver;

/// Acquires the bus lines described by `bus` from `gpio` and brings the display up.
///
/// # Errors
/// Fails if any of the lines can't be acquired. No line stays claimed in that case.
pub fn initialize<'a, G: GpioDriver>(
    gpio: &'a G,
    bus: &BusConfig,
    geometry: Geometry,
) -> GpioResult<Lcd<GpioHD44780Driver<'a>>> {
    let driver = GpioHD44780Driver::new(gpio, bus)?;
    Ok(Lcd::initialize(driver, geometry))
}
