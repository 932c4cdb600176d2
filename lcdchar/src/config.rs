use lcdchar_gpio::GpioActiveLevel;
use lcdchar_gpio::GpioError;
use lcdchar_gpio::lcd::hd44780::{BusConfig, Font, Geometry};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// RW line number meaning "not wired", i.e. RW tied to ground.
pub const RW_NOT_WIRED: usize = 255;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },
    #[error("expected {expected} data pins, got {got}")]
    DataPinCount { expected: usize, got: usize },
    #[error("invalid geometry {columns}x{rows}: {source}")]
    Geometry {
        columns: u8,
        rows: u8,
        source: GpioError,
    },
}

/// Bring-up parameters of the display.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// GPIO character device the lines belong to.
    pub gpio_chip: String,
    pub four_bit: bool,
    pub pin_rs: usize,
    /// `None` or [RW_NOT_WIRED] when RW is tied to ground.
    pub pin_rw: Option<usize>,
    pub pin_e: usize,
    /// D4-D7 in 4-bit mode, D0-D7 in 8-bit mode.
    pub pins_data: Vec<usize>,
    /// Whether the lines go through an inverting level shifter.
    pub active_low: bool,
    pub columns: u8,
    pub rows: u8,
    pub font_5x10: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gpio_chip: "/dev/gpiochip0".to_string(),
            four_bit: true,
            pin_rs: 25,
            pin_rw: None,
            pin_e: 24,
            pins_data: vec![23, 17, 18, 22],
            active_low: false,
            columns: 16,
            rows: 2,
            font_5x10: false,
        }
    }
}

impl Config {
    /// Loads the config from the JSON file named by `LCDCHAR_CONFIG` (`lcdchar.json` by default),
    /// or from `LCDCHAR_*` environment variables if there is no such file.
    pub fn load() -> Result<Self, ConfigError> {
        let config_str = var_os("LCDCHAR_CONFIG");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("lcdchar.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let file = std::fs::File::open(config_path)?;
            let reader = std::io::BufReader::new(file);
            Ok(serde_json::from_reader(reader)?)
        } else {
            debug!("{} not found, loading config from environment", config_path.display());
            Self::from_vars(|name| dotenv::var(name).ok())
        }
    }

    /// Builds the config from variables looked up through `var`, keeping the default for every
    /// variable that is not set.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(chip) = var("LCDCHAR_GPIO_CHIP") {
            config.gpio_chip = chip;
        }
        parse_var(&var, "LCDCHAR_FOUR_BIT", &mut config.four_bit)?;
        parse_var(&var, "LCDCHAR_PIN_RS", &mut config.pin_rs)?;
        parse_var(&var, "LCDCHAR_PIN_E", &mut config.pin_e)?;
        if let Some(value) = var("LCDCHAR_PIN_RW") {
            let value = value.trim();
            config.pin_rw = if value.is_empty() {
                None
            } else {
                Some(value.parse().map_err(|_| invalid("LCDCHAR_PIN_RW", value))?)
            };
        }
        if let Some(value) = var("LCDCHAR_PINS_DATA") {
            config.pins_data =
                parse_pin_list(&value).ok_or_else(|| invalid("LCDCHAR_PINS_DATA", &value))?;
        }
        parse_var(&var, "LCDCHAR_ACTIVE_LOW", &mut config.active_low)?;
        parse_var(&var, "LCDCHAR_COLUMNS", &mut config.columns)?;
        parse_var(&var, "LCDCHAR_ROWS", &mut config.rows)?;
        parse_var(&var, "LCDCHAR_FONT_5X10", &mut config.font_5x10)?;

        Ok(config)
    }

    /// Converts the wiring into the bus description of the core.
    pub fn bus_config(&self) -> Result<BusConfig, ConfigError> {
        let rw = self.pin_rw.filter(|&pin| pin != RW_NOT_WIRED);
        let bus = if self.four_bit {
            BusConfig::new_4bit(self.pin_rs, rw, self.pin_e, self.data_pins()?)
        } else {
            BusConfig::new_8bit(self.pin_rs, rw, self.pin_e, self.data_pins()?)
        };
        let level = if self.active_low {
            GpioActiveLevel::Low
        } else {
            GpioActiveLevel::High
        };
        Ok(bus.with_active_level(level))
    }

    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        let font = if self.font_5x10 {
            Font::Dots5x10
        } else {
            Font::Dots5x8
        };
        Geometry::new(self.columns, self.rows)
            .map(|geometry| geometry.with_font(font))
            .map_err(|source| ConfigError::Geometry {
                columns: self.columns,
                rows: self.rows,
                source,
            })
    }

    fn data_pins<const N: usize>(&self) -> Result<[usize; N], ConfigError> {
        self.pins_data
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::DataPinCount {
                expected: N,
                got: self.pins_data.len(),
            })
    }
}

/// Parses a list of line numbers separated by `,`, ` ` or `;`.
pub fn parse_pin_list(pin_str: &str) -> Option<Vec<usize>> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = var(name) {
        *target = value.trim().parse().map_err(|_| invalid(name, &value))?;
    }
    Ok(())
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}
