use crate::lcd::hd44780::config::{BusConfig, BusWidth, DataPins};
use crate::lcd::hd44780::driver::HD44780Driver;
use crate::lcd::hd44780::state::FunctionSet;
use crate::{GpioBusOutput, GpioDriver, GpioOutput, GpioResult};
use log::{debug, trace, warn};
use std::thread::sleep;
use std::time::Duration;

/// Enable low before the rising edge.
const ENABLE_SETUP: Duration = Duration::from_micros(1);
/// Enable high time, must exceed 450 ns.
const ENABLE_PULSE: Duration = Duration::from_micros(2);
/// Time the controller needs to latch a transfer, most instructions take 37 us.
const SETTLE: Duration = Duration::from_micros(100);
/// Wait after power rises above 2.7 V, at least 40 ms.
const POWER_ON: Duration = Duration::from_millis(50);
/// Wait after the first two handshake transfers, at least 4.1 ms.
const SYNC_LONG: Duration = Duration::from_millis(5);
/// Wait after the third handshake transfer, at least 100 us.
const SYNC_SHORT: Duration = Duration::from_micros(150);

pub enum GpioHD44780Bus<'a> {
    Bus8Bit(Box<dyn GpioBusOutput<8> + 'a>),
    Bus4Bit(Box<dyn GpioBusOutput<4> + 'a>),
}

impl std::fmt::Debug for GpioHD44780Bus<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpioHD44780Bus::Bus8Bit(bus) => write!(f, "Bus8Bit({:?})", bus),
            GpioHD44780Bus::Bus4Bit(bus) => write!(f, "Bus4Bit({:?})", bus),
        }
    }
}

/// HD44780 driver writing to the controller over GPIO lines.
///
/// Owns every line it was created with. They are released when the driver is dropped.
/// The bus is only ever written, even when an R/W line is wired, which is then held low.
#[derive(Debug)]
pub struct GpioHD44780Driver<'a> {
    pin_e: Box<dyn GpioOutput + 'a>,
    pin_rw: Option<Box<dyn GpioOutput + 'a>>,
    pin_rs: Box<dyn GpioOutput + 'a>,
    data_bus: GpioHD44780Bus<'a>,
}

impl<'a> GpioHD44780Driver<'a> {
    /// Acquires every line in `config` from `gpio` as an output at logic-low.
    ///
    /// # Errors
    /// Fails if a line is out of range or already in use. Lines acquired before the failing one
    /// are released again.
    pub fn new<G: GpioDriver>(gpio: &'a G, config: &BusConfig) -> GpioResult<Self> {
        let level = config.active_level;

        let pin_rs = gpio.get_output(config.rs, level)?;
        debug!("LCD RS on line {}", config.rs);

        let pin_rw = match config.rw {
            Some(rw) => {
                debug!("LCD RW on line {}", rw);
                Some(gpio.get_output(rw, level)?)
            }
            None => {
                debug!("LCD RW not wired, expecting it tied to ground");
                None
            }
        };

        let pin_e = gpio.get_output(config.enable, level)?;
        debug!("LCD E on line {}", config.enable);

        let data_bus = match config.data {
            DataPins::FourBit(pins) => {
                debug!("LCD D4..D7 on lines {:?}", pins);
                GpioHD44780Bus::Bus4Bit(gpio.get_output_bus(pins, level)?)
            }
            DataPins::EightBit(pins) => {
                debug!("LCD D0..D7 on lines {:?}", pins);
                GpioHD44780Bus::Bus8Bit(gpio.get_output_bus(pins, level)?)
            }
        };

        Ok(GpioHD44780Driver {
            pin_e,
            pin_rw,
            pin_rs,
            data_bus,
        })
    }

    fn drive(pin: &dyn GpioOutput, value: bool) {
        if let Err(err) = pin.write(value) {
            warn!("Lost write of {} to {:?}: {}", value as u8, pin, err);
        }
    }

    fn pulse_e(pin: &dyn GpioOutput) {
        Self::drive(pin, false);
        sleep(ENABLE_SETUP);
        Self::drive(pin, true);
        sleep(ENABLE_PULSE);
        Self::drive(pin, false);
        sleep(SETTLE);
    }

    /// Puts `value` on the data lines and strobes it in. On a 4-bit bus only the low nibble of
    /// `value` is used.
    fn write_bits(&self, value: u8) {
        let written = match &self.data_bus {
            GpioHD44780Bus::Bus8Bit(bus) => {
                trace!("Writing B: {:08b}", value);
                bus.write_byte(value)
            }
            GpioHD44780Bus::Bus4Bit(bus) => {
                trace!("Writing N: {:04b}", value & 0x0F);
                bus.write_nibble(value & 0x0F)
            }
        };
        if let Err(err) = written {
            warn!("Lost data bus write {:#04x}: {}", value, err);
        }
        Self::pulse_e(&*self.pin_e);
    }

    fn send(&self, data: u8, rs: bool) {
        trace!("Sending data: {:08b}, RS: {}", data, rs);

        // Set RS pin
        Self::drive(&*self.pin_rs, rs);

        // Set RW pin to write
        if let Some(rw) = &self.pin_rw {
            Self::drive(&**rw, false);
        }

        match self.data_bus {
            GpioHD44780Bus::Bus8Bit(_) => self.write_bits(data),
            GpioHD44780Bus::Bus4Bit(_) => {
                self.write_bits(data >> 4);
                self.write_bits(data);
            }
        }
    }
}

impl HD44780Driver for GpioHD44780Driver<'_> {
    fn bus_width(&self) -> BusWidth {
        match self.data_bus {
            GpioHD44780Bus::Bus8Bit(_) => BusWidth::Eight,
            GpioHD44780Bus::Bus4Bit(_) => BusWidth::Four,
        }
    }

    /// Runs the reset-by-instruction sequence from the HD44780 datasheet (figures 23 and 24).
    ///
    /// On a 4-bit bus, `0011` is sent three times as a lone nibble, which leaves the controller in
    /// 8-bit mode whatever it was in before, then `0010` switches it to 4-bit mode. On an 8-bit bus
    /// the function set command is simply sent three times.
    fn synchronize(&mut self, function: FunctionSet) {
        sleep(POWER_ON);

        Self::drive(&*self.pin_rs, false);
        Self::drive(&*self.pin_e, false);
        if let Some(rw) = &self.pin_rw {
            Self::drive(&**rw, false);
        }

        match self.data_bus {
            GpioHD44780Bus::Bus4Bit(_) => {
                self.write_bits(0b0011);
                sleep(SYNC_LONG);
                self.write_bits(0b0011);
                sleep(SYNC_LONG);
                self.write_bits(0b0011);
                sleep(SYNC_SHORT);
                self.write_bits(0b0010);
                debug!("LCD interface synchronized in 4-bit mode");
            }
            GpioHD44780Bus::Bus8Bit(_) => {
                self.function_set(function);
                sleep(SYNC_LONG);
                self.function_set(function);
                sleep(SYNC_LONG);
                self.function_set(function);
                debug!("LCD interface synchronized in 8-bit mode");
            }
        }
    }

    fn send_command(&mut self, command: u8) {
        self.send(command, false)
    }

    fn send_data(&mut self, data: u8) {
        self.send(data, true)
    }

    fn wait(&mut self, duration: Duration) {
        sleep(duration);
    }

    fn shutdown(&mut self) {
        Self::drive(&*self.pin_rs, false);
        if let Some(rw) = &self.pin_rw {
            Self::drive(&**rw, false);
        }
        Self::drive(&*self.pin_e, false);
        let written = match &self.data_bus {
            GpioHD44780Bus::Bus8Bit(bus) => bus.write(&[false; 8]),
            GpioHD44780Bus::Bus4Bit(bus) => bus.write(&[false; 4]),
        };
        if let Err(err) = written {
            warn!("Lost data bus write while shutting down: {}", err);
        }
        debug!("LCD lines driven low");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::hd44780::config::Font;
    use crate::mock::{LineEvent, MockGpioDriver};
    use crate::{GpioActiveLevel, GpioError};

    const RS: usize = 0;
    const RW: usize = 1;
    const E: usize = 2;
    const DATA4: [usize; 4] = [3, 4, 5, 6];
    const DATA8: [usize; 8] = [3, 4, 5, 6, 7, 8, 9, 10];

    /// A transfer latched by the controller: RS level and data bus value at the enable falling edge.
    #[derive(Debug, Eq, PartialEq)]
    struct Strobe {
        rs: bool,
        value: u8,
    }

    fn strobes(history: &[LineEvent], data: &[usize]) -> Vec<Strobe> {
        let mut levels = [false; 16];
        let mut strobes = Vec::new();
        for event in history {
            let was_high = levels[event.index];
            levels[event.index] = event.level;
            if event.index == E && was_high && !event.level {
                let value = data
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (bit, &line)| acc | ((levels[line] as u8) << bit));
                strobes.push(Strobe {
                    rs: levels[RS],
                    value,
                });
            }
        }
        strobes
    }

    fn function(width: BusWidth) -> FunctionSet {
        FunctionSet {
            bus_width: width,
            two_lines: true,
            font: Font::Dots5x8,
        }
    }

    #[test]
    fn four_bit_byte_is_sent_high_nibble_first() {
        let gpio = MockGpioDriver::new(16);
        let mut driver =
            GpioHD44780Driver::new(&gpio, &BusConfig::new_4bit(RS, Some(RW), E, DATA4)).unwrap();
        gpio.clear_history();

        driver.send_data(0xA5);
        driver.send_command(0x3C);

        assert_eq!(
            strobes(&gpio.history(), &DATA4),
            vec![
                Strobe { rs: true, value: 0xA },
                Strobe { rs: true, value: 0x5 },
                Strobe { rs: false, value: 0x3 },
                Strobe { rs: false, value: 0xC },
            ]
        );
        assert!(!gpio.level(RW));
    }

    #[test]
    fn eight_bit_byte_is_one_strobe() {
        let gpio = MockGpioDriver::new(16);
        let mut driver =
            GpioHD44780Driver::new(&gpio, &BusConfig::new_8bit(RS, None, E, DATA8)).unwrap();
        gpio.clear_history();

        driver.send_data(b'H');

        assert_eq!(
            strobes(&gpio.history(), &DATA8),
            vec![Strobe { rs: true, value: b'H' }]
        );
    }

    #[test]
    fn enable_strobe_order() {
        let gpio = MockGpioDriver::new(16);
        let mut driver =
            GpioHD44780Driver::new(&gpio, &BusConfig::new_8bit(RS, None, E, DATA8)).unwrap();
        gpio.clear_history();

        driver.send_command(0x01);

        let enable: Vec<bool> = gpio
            .history()
            .iter()
            .filter(|event| event.index == E)
            .map(|event| event.level)
            .collect();
        assert_eq!(enable, vec![false, true, false]);
    }

    #[test]
    fn four_bit_handshake() {
        let gpio = MockGpioDriver::new(16);
        let mut driver =
            GpioHD44780Driver::new(&gpio, &BusConfig::new_4bit(RS, None, E, DATA4)).unwrap();
        gpio.clear_history();

        driver.synchronize(function(BusWidth::Four));

        assert_eq!(
            strobes(&gpio.history(), &DATA4),
            vec![
                Strobe { rs: false, value: 0x3 },
                Strobe { rs: false, value: 0x3 },
                Strobe { rs: false, value: 0x3 },
                Strobe { rs: false, value: 0x2 },
            ]
        );
    }

    #[test]
    fn eight_bit_handshake_repeats_function_set() {
        let gpio = MockGpioDriver::new(16);
        let mut driver =
            GpioHD44780Driver::new(&gpio, &BusConfig::new_8bit(RS, Some(RW), E, DATA8)).unwrap();
        gpio.clear_history();

        driver.synchronize(function(BusWidth::Eight));

        let expected = 0b0010_0000 | 0b0001_0000 | 0b0000_1000;
        assert_eq!(
            strobes(&gpio.history(), &DATA8),
            vec![
                Strobe { rs: false, value: expected },
                Strobe { rs: false, value: expected },
                Strobe { rs: false, value: expected },
            ]
        );
    }

    #[test]
    fn acquisition_failure_releases_acquired_lines() {
        let gpio = MockGpioDriver::new(16);
        let _taken = gpio.get_output(E, GpioActiveLevel::High).unwrap();

        let err = GpioHD44780Driver::new(&gpio, &BusConfig::new_4bit(RS, Some(RW), E, DATA4))
            .unwrap_err();

        assert_eq!(err, GpioError::AlreadyInUse);
        assert!(!gpio.is_in_use(RS));
        assert!(!gpio.is_in_use(RW));
    }

    #[test]
    fn shutdown_drives_all_lines_low_and_drop_releases_them() {
        let gpio = MockGpioDriver::new(16);
        let mut driver =
            GpioHD44780Driver::new(&gpio, &BusConfig::new_4bit(RS, Some(RW), E, DATA4)).unwrap();
        driver.send_data(0xFF);

        driver.shutdown();
        for line in [RS, RW, E].into_iter().chain(DATA4) {
            assert!(!gpio.level(line), "line {} still high", line);
        }

        drop(driver);
        for line in [RS, RW, E].into_iter().chain(DATA4) {
            assert!(!gpio.is_in_use(line));
        }
    }

    #[test]
    fn inverted_level_shifter() {
        let gpio = MockGpioDriver::new(16);
        let config =
            BusConfig::new_4bit(RS, None, E, DATA4).with_active_level(GpioActiveLevel::Low);
        let mut driver = GpioHD44780Driver::new(&gpio, &config).unwrap();

        // Logic-low idles physically high
        assert!(gpio.level(E));
        driver.send_data(0x0F);
        assert!(gpio.level(E));
        assert!(!gpio.level(DATA4[0]));
    }
}
