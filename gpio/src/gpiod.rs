//! GpiodDriver implementation for managing GPIO lines using the gpiod library.
//!
//! Talks to the Linux GPIO character device (`/dev/gpiochipN`), so it works on any board the
//! kernel exposes a gpiochip for, without root access to `/dev/mem`.
use crate::{GpioActiveLevel, GpioBusOutput, GpioDriver, GpioError, GpioOutput, GpioResult};
use bitvec::vec::BitVec;
use log::debug;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::atomic::AtomicU8;

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO lines.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: BitVec<AtomicU8>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        let bits = BitVec::repeat(false, n);
        Self {
            chip,
            used_pins: bits,
        }
    }

    /// Opens the GPIO chip at the given path, e.g. `/dev/gpiochip0`.
    pub fn open(path: impl AsRef<Path>) -> GpioResult<Self> {
        let chip = gpiod::Chip::new(path.as_ref())?;
        Ok(Self::new(chip))
    }

    fn claim(&self, indices: &[usize]) -> GpioResult<()> {
        let n = self.count()?;

        if indices.iter().any(|&index| index >= n) {
            return Err(GpioError::InvalidArgument);
        }

        // A line listed twice in one request counts as already in use
        for (i, index) in indices.iter().enumerate() {
            if self.used_pins[*index] || indices[..i].contains(index) {
                return Err(GpioError::AlreadyInUse);
            }
        }

        for &index in indices {
            self.used_pins.set_aliased(index, true);
        }
        Ok(())
    }

    fn release(&self, indices: &[usize]) {
        for &index in indices {
            self.used_pins.set_aliased(index, false);
        }
        debug!("{:?} released lines {:?}", self, indices);
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_output(
        &self,
        index: usize,
        level: GpioActiveLevel,
    ) -> GpioResult<Box<dyn GpioOutput + '_>> {
        self.claim(&[index])?;

        let line = self.chip.request_lines(
            gpiod::Options::output([index as u32])
                .values([false])
                .consumer(env!("CARGO_PKG_NAME"))
                .active(level.into()),
        );
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                self.release(&[index]);
                return Err(err.into());
            }
        };

        debug!("{:?} acquired output line {}", self, index);
        Ok(Box::new(GpiodOutput {
            driver: self,
            pin_index: index,
            line,
        }))
    }

    fn get_output_bus<const N: usize>(
        &self,
        indices: [usize; N],
        level: GpioActiveLevel,
    ) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>> {
        self.claim(&indices)?;

        let line = self.chip.request_lines(
            gpiod::Options::output(
                indices
                    .iter()
                    .map(|&index| index as u32)
                    .collect::<Vec<_>>(),
            )
            .values([false; N])
            .consumer(env!("CARGO_PKG_NAME"))
            .active(level.into()),
        );
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                self.release(&indices);
                return Err(err.into());
            }
        };

        debug!("{:?} acquired output bus {:?}", self, indices);
        Ok(Box::new(GpiodBusOutput {
            driver: self,
            pin_indices: indices,
            line,
        }))
    }
}

impl From<GpioActiveLevel> for gpiod::Active {
    fn from(level: GpioActiveLevel) -> Self {
        match level {
            GpioActiveLevel::High => gpiod::Active::High,
            GpioActiveLevel::Low => gpiod::Active::Low,
        }
    }
}

struct GpiodOutput<'a> {
    driver: &'a GpiodDriver,
    pin_index: usize,
    line: gpiod::Lines<gpiod::Output>,
}

impl Debug for GpiodOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.driver, self.pin_index)
    }
}

impl GpioOutput for GpiodOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.line.set_values([value])?;
        Ok(())
    }
}

impl Drop for GpiodOutput<'_> {
    fn drop(&mut self) {
        self.driver.release(&[self.pin_index]);
    }
}

struct GpiodBusOutput<'a, const N: usize> {
    driver: &'a GpiodDriver,
    pin_indices: [usize; N],
    line: gpiod::Lines<gpiod::Output>,
}

impl<const N: usize> Debug for GpiodBusOutput<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{:?}[output]", self.driver, self.pin_indices)
    }
}

impl<const N: usize> GpioBusOutput<N> for GpiodBusOutput<'_, N> {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        self.line.set_values(*values)?;
        Ok(())
    }
}

impl<const N: usize> Drop for GpiodBusOutput<'_, N> {
    fn drop(&mut self) {
        self.driver.release(&self.pin_indices);
    }
}
