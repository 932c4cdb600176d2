//! In-memory GPIO backend.
//!
//! Every line keeps its physical level, and every write is appended to a history that tests (or a
//! dry run of the binary) can inspect. No hardware is touched.
use crate::{GpioActiveLevel, GpioBusOutput, GpioDriver, GpioError, GpioOutput, GpioResult};
use bitvec::vec::BitVec;
use log::{debug, trace};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;

/// A single physical level change (or re-assertion) on a mock line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LineEvent {
    pub index: usize,
    pub level: bool,
}

pub struct MockGpioDriver {
    used_pins: BitVec<AtomicU8>,
    levels: RefCell<Vec<bool>>,
    history: RefCell<Vec<LineEvent>>,
}

impl MockGpioDriver {
    /// Creates a mock chip with `count` lines, all low and unowned.
    pub fn new(count: usize) -> Self {
        Self {
            used_pins: BitVec::repeat(false, count),
            levels: RefCell::new(vec![false; count]),
            history: RefCell::new(Vec::new()),
        }
    }

    /// Gets the physical level of the line.
    pub fn level(&self, index: usize) -> bool {
        self.levels.borrow()[index]
    }

    /// Gets whether the line is currently owned by a handle.
    pub fn is_in_use(&self, index: usize) -> bool {
        self.used_pins[index]
    }

    /// Gets a copy of every line write so far, oldest first.
    pub fn history(&self) -> Vec<LineEvent> {
        self.history.borrow().clone()
    }

    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    fn set_level(&self, index: usize, level: bool) {
        trace!("mock line {} <- {}", index, level as u8);
        self.levels.borrow_mut()[index] = level;
        self.history.borrow_mut().push(LineEvent { index, level });
    }

    fn claim(&self, indices: &[usize]) -> GpioResult<()> {
        let n = self.used_pins.len();

        if indices.iter().any(|&index| index >= n) {
            return Err(GpioError::InvalidArgument);
        }

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

impl Debug for MockGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockGpioDriver({})", self.used_pins.len())
    }
}

impl GpioDriver for MockGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.used_pins.len())
    }

    fn get_output(
        &self,
        index: usize,
        level: GpioActiveLevel,
    ) -> GpioResult<Box<dyn GpioOutput + '_>> {
        self.claim(&[index])?;
        self.set_level(index, level.get_state(false));
        Ok(Box::new(MockOutput {
            driver: self,
            pin_index: index,
            level,
        }))
    }

    fn get_output_bus<const N: usize>(
        &self,
        indices: [usize; N],
        level: GpioActiveLevel,
    ) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>> {
        self.claim(&indices)?;
        for &index in &indices {
            self.set_level(index, level.get_state(false));
        }
        Ok(Box::new(MockBusOutput {
            driver: self,
            pin_indices: indices,
            level,
        }))
    }
}

struct MockOutput<'a> {
    driver: &'a MockGpioDriver,
    pin_index: usize,
    level: GpioActiveLevel,
}

impl Debug for MockOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.driver, self.pin_index)
    }
}

impl GpioOutput for MockOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.driver
            .set_level(self.pin_index, self.level.get_state(value));
        Ok(())
    }
}

impl Drop for MockOutput<'_> {
    fn drop(&mut self) {
        self.driver.release(&[self.pin_index]);
    }
}

struct MockBusOutput<'a, const N: usize> {
    driver: &'a MockGpioDriver,
    pin_indices: [usize; N],
    level: GpioActiveLevel,
}

impl<const N: usize> Debug for MockBusOutput<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{:?}[output]", self.driver, self.pin_indices)
    }
}

impl<const N: usize> GpioBusOutput<N> for MockBusOutput<'_, N> {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        for (&index, &value) in self.pin_indices.iter().zip(values) {
            self.driver.set_level(index, self.level.get_state(value));
        }
        Ok(())
    }
}

impl<const N: usize> Drop for MockBusOutput<'_, N> {
    fn drop(&mut self) {
        self.driver.release(&self.pin_indices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquired_lines_start_low_and_are_released_on_drop() {
        let gpio = MockGpioDriver::new(8);
        {
            let out = gpio.get_output(3, GpioActiveLevel::High).unwrap();
            assert!(gpio.is_in_use(3));
            assert!(!gpio.level(3));
            out.write(true).unwrap();
            assert!(gpio.level(3));
        }
        assert!(!gpio.is_in_use(3));
    }

    #[test]
    fn double_acquisition_fails() {
        let gpio = MockGpioDriver::new(8);
        let _out = gpio.get_output(1, GpioActiveLevel::High).unwrap();
        assert_eq!(
            gpio.get_output(1, GpioActiveLevel::High).unwrap_err(),
            GpioError::AlreadyInUse
        );
        assert_eq!(
            gpio.get_output_bus([0, 1, 2, 3], GpioActiveLevel::High)
                .unwrap_err(),
            GpioError::AlreadyInUse
        );
        // Failed bus request must not leave its other lines claimed
        assert!(!gpio.is_in_use(0));
    }

    #[test]
    fn out_of_range_and_duplicate_indices_are_rejected() {
        let gpio = MockGpioDriver::new(4);
        assert_eq!(
            gpio.get_output(4, GpioActiveLevel::High).unwrap_err(),
            GpioError::InvalidArgument
        );
        assert_eq!(
            gpio.get_output_bus([0, 0], GpioActiveLevel::High).unwrap_err(),
            GpioError::AlreadyInUse
        );
    }

    #[test]
    fn nibble_maps_bit_zero_to_first_line() {
        let gpio = MockGpioDriver::new(8);
        let bus = gpio
            .get_output_bus([7, 6, 5, 4], GpioActiveLevel::High)
            .unwrap();
        bus.write_nibble(0b0011).unwrap();
        assert!(gpio.level(7));
        assert!(gpio.level(6));
        assert!(!gpio.level(5));
        assert!(!gpio.level(4));
        assert_eq!(bus.write_nibble(0x10).unwrap_err(), GpioError::InvalidArgument);
    }

    #[test]
    fn active_low_inverts_physical_level() {
        let gpio = MockGpioDriver::new(2);
        let out = gpio.get_output(0, GpioActiveLevel::Low).unwrap();
        // Logic-low on an active-low line is physically high
        assert!(gpio.level(0));
        out.write(true).unwrap();
        assert!(!gpio.level(0));
    }
}
