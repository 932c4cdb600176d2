//! Exclusive access to an initialized display.
//!
//! A [Device] hands out at most one [Session] at a time. The session is the data stream of the
//! display: bytes written to it go through the layout engine, and reading it yields the screen
//! content.

use crate::attributes::{self, Attribute};
use lcdchar_gpio::lcd::hd44780::Lcd;
use lcdchar_gpio::lcd::hd44780::driver::HD44780Driver;
use log::{debug, info};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SessionError {
    #[error("the display is already open")]
    Busy,
}

#[derive(Debug)]
pub struct Device<D: HD44780Driver> {
    lcd: Mutex<Lcd<D>>,
}

impl<D: HD44780Driver> Device<D> {
    pub fn new(lcd: Lcd<D>) -> Self {
        Device {
            lcd: Mutex::new(lcd),
        }
    }

    /// Opens the display.
    ///
    /// # Errors
    /// `SessionError::Busy` while another session is open.
    pub fn open(&self) -> Result<Session<'_, D>, SessionError> {
        let lcd = match self.lcd.try_lock() {
            Ok(lcd) => lcd,
            Err(TryLockError::WouldBlock) => return Err(SessionError::Busy),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        info!("Session opened");
        Ok(Session {
            lcd,
            read_offset: 0,
        })
    }

    /// Gives the display back, e.g. to uninitialize it.
    pub fn into_inner(self) -> Lcd<D> {
        self.lcd.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Session<'a, D: HD44780Driver> {
    lcd: MutexGuard<'a, Lcd<D>>,
    read_offset: u64,
}

impl<D: HD44780Driver> Session<'_, D> {
    pub fn show(&self, attribute: Attribute) -> String {
        attributes::show(&self.lcd, attribute)
    }

    pub fn store(&mut self, attribute: Attribute, input: &str) -> usize {
        attributes::store(&mut self.lcd, attribute, input)
    }

    pub fn lcd(&mut self) -> &mut Lcd<D> {
        &mut self.lcd
    }
}

impl<D: HD44780Driver> Write for Session<'_, D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        debug!("Writing {} bytes", buf.len());
        self.lcd.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<D: HD44780Driver> Read for Session<'_, D> {
    /// Reads the screen content from the current offset. Every row is followed by a line break.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let snapshot = self.lcd.screen().snapshot();
        let remaining = usize::try_from(self.read_offset)
            .ok()
            .and_then(|offset| snapshot.get(offset..))
            .unwrap_or_default();
        let count = remaining.len().min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.read_offset += count as u64;
        Ok(count)
    }
}

impl<D: HD44780Driver> Seek for Session<'_, D> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(offset) => {
                self.read_offset = offset;
                return Ok(offset);
            }
            SeekFrom::Current(offset) => (self.read_offset, offset),
            SeekFrom::End(offset) => (self.lcd.screen().snapshot().len() as u64, offset),
        };
        self.read_offset = base.checked_add_signed(offset).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before the start")
        })?;
        Ok(self.read_offset)
    }
}

impl<D: HD44780Driver> Drop for Session<'_, D> {
    fn drop(&mut self) {
        info!("Session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcdchar_gpio::lcd::hd44780::driver::GpioHD44780Driver;
    use lcdchar_gpio::lcd::hd44780::{self, BusConfig, CursorPosition, Geometry};
    use lcdchar_gpio::mock::MockGpioDriver;

    fn device(gpio: &MockGpioDriver) -> Device<GpioHD44780Driver<'_>> {
        let bus = BusConfig::new_4bit(0, None, 1, [2, 3, 4, 5]);
        let lcd = hd44780::initialize(gpio, &bus, Geometry::new(8, 2).unwrap()).unwrap();
        Device::new(lcd)
    }

    #[test]
    fn only_one_session_at_a_time() {
        let gpio = MockGpioDriver::new(6);
        let device = device(&gpio);

        let session = device.open().unwrap();
        assert_eq!(device.open().err(), Some(SessionError::Busy));
        drop(session);

        assert!(device.open().is_ok());
    }

    #[test]
    fn writes_go_through_layout() {
        let gpio = MockGpioDriver::new(6);
        let device = device(&gpio);
        let mut session = device.open().unwrap();

        assert_eq!(session.write(b"abcdefghXY").unwrap(), 10);

        assert_eq!(session.lcd().cursor_position(), CursorPosition::new(2, 1));
        assert_eq!(session.show(Attribute::Position), "2:1\n");
    }

    #[test]
    fn read_serves_the_snapshot_from_the_offset() {
        let gpio = MockGpioDriver::new(6);
        let device = device(&gpio);
        let mut session = device.open().unwrap();
        session.write_all(b"hello\nworld").unwrap();

        let mut head = [0; 4];
        assert_eq!(session.read(&mut head).unwrap(), 4);
        assert_eq!(&head, b"hell");

        let mut rest = Vec::new();
        session.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"o   \nworld   \n".to_vec());
        assert_eq!(session.read(&mut head).unwrap(), 0);

        session.seek(SeekFrom::Start(9)).unwrap();
        let mut row = String::new();
        session.read_to_string(&mut row).unwrap();
        assert_eq!(row, "world   \n");

        assert!(session.seek(SeekFrom::Current(-100)).is_err());
        assert_eq!(session.seek(SeekFrom::End(-9)).unwrap(), 9);
    }

    #[test]
    fn attributes_through_the_session() {
        let gpio = MockGpioDriver::new(6);
        let device = device(&gpio);
        let mut session = device.open().unwrap();

        assert_eq!(session.store(Attribute::Display, "off"), 3);
        assert_eq!(session.show(Attribute::Display), "off\n");
        assert_eq!(session.store(Attribute::Position, "11:3"), 4);
        assert_eq!(session.show(Attribute::Position), "11:1\n");
    }

    #[test]
    fn display_outlives_sessions() {
        let gpio = MockGpioDriver::new(6);
        let device = device(&gpio);
        device.open().unwrap().write_all(b"kept").unwrap();

        let mut session = device.open().unwrap();
        let mut screen = String::new();
        session.read_to_string(&mut screen).unwrap();
        assert_eq!(screen, "kept    \n        \n");
        drop(session);

        device.into_inner().uninitialize();
        assert!((0..6).all(|line| !gpio.is_in_use(line)));
    }
}
