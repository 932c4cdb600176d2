mod attributes;
mod config;
mod session;

use crate::attributes::Attribute;
use crate::config::Config;
use crate::session::Device;
use clap::{ArgAction, Parser};
use dotenv::dotenv;
use lcdchar_gpio::GpioDriver;
use lcdchar_gpio::gpiod::GpiodDriver;
use lcdchar_gpio::lcd::hd44780::{self, BusConfig, Geometry};
use lcdchar_gpio::mock::MockGpioDriver;
use log::{debug, info};
use std::io::{self, Read, Write};
use sysinfo::System;

/// Shown right after bring-up, one row per line.
const BANNER: [&str; 2] = ["*     LCD     *", "* initialized *"];

/// Number of lines of the in-memory GPIO chip used by `--mock`.
const MOCK_LINE_COUNT: usize = 64;

#[derive(Debug, Parser)]
#[command(name = "lcdchar", version, about = "HD44780 character LCD over GPIO")]
struct Cli {
    /// Drive in-memory GPIO lines instead of the GPIO character device
    #[arg(long, action = ArgAction::SetTrue)]
    mock: bool,
    /// Sets a control attribute before reading standard input, e.g. `--set position=0:1`
    #[arg(long = "set", value_name = "ATTR=VALUE", value_parser = parse_assignment)]
    set: Vec<(Attribute, String)>,
    /// Prints every attribute and the screen content before shutting down
    #[arg(long, action = ArgAction::SetTrue)]
    show: bool,
    /// Skips the power-on banner
    #[arg(long, action = ArgAction::SetTrue)]
    no_banner: bool,
}

fn parse_assignment(s: &str) -> Result<(Attribute, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ATTR=VALUE, got {s:?}"))?;
    let attribute = name
        .trim()
        .parse::<Attribute>()
        .map_err(|err| err.to_string())?;
    Ok((attribute, value.to_string()))
}

/// Lays the banner out for a display `columns` wide: every line centered and cut to the width,
/// so no line wraps onto the next row.
fn banner(columns: u8) -> Vec<u8> {
    let columns = columns as usize;
    let lines: Vec<String> = BANNER
        .iter()
        .map(|line| {
            let padding = columns.saturating_sub(line.len()) / 2;
            let mut row = " ".repeat(padding) + line;
            row.truncate(columns);
            row
        })
        .collect();
    lines.join("\n").into_bytes()
}

fn log_host() {
    info!(
        "Host: {} ({} {}, kernel {})",
        System::host_name().unwrap_or_default(),
        System::name().unwrap_or_default(),
        System::os_version().unwrap_or_default(),
        System::kernel_version().unwrap_or_default(),
    );
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    let cli = Cli::parse();

    info!("lcdchar starting...");
    log_host();

    debug!("Loading config...");
    let config = Config::load()?;
    let bus = config.bus_config()?;
    let geometry = config.geometry()?;
    info!(
        "LCD @ RS: {}, RW: {:?}, E: {}, Data: {:?}, {}x{}",
        bus.rs,
        bus.rw,
        bus.enable,
        bus.data,
        geometry.columns(),
        geometry.rows()
    );

    if cli.mock {
        let gpio = MockGpioDriver::new(MOCK_LINE_COUNT);
        debug!("{:?} initialized.", gpio);
        run(&cli, &gpio, &bus, geometry)
    } else {
        let gpio = GpiodDriver::open(&config.gpio_chip)?;
        debug!("{:?} initialized.", gpio);
        run(&cli, &gpio, &bus, geometry)
    }
}

fn run<G: GpioDriver>(
    cli: &Cli,
    gpio: &G,
    bus: &BusConfig,
    geometry: Geometry,
) -> eyre::Result<()> {
    debug!("Initializing LCD driver...");
    let mut lcd = hd44780::initialize(gpio, bus, geometry)?;
    if !cli.no_banner {
        lcd.write(&banner(geometry.columns()));
        lcd.set_cursor_visible(true);
        lcd.set_blink(true);
    }
    info!("LCD initialized.");

    let device = Device::new(lcd);
    {
        let mut session = device.open()?;
        for (attribute, value) in &cli.set {
            session.store(*attribute, value);
        }

        let copied = io::copy(&mut io::stdin().lock(), &mut session)?;
        debug!("Copied {copied} bytes from standard input");

        if cli.show {
            let mut stdout = io::stdout().lock();
            for attribute in Attribute::ALL {
                write!(stdout, "{attribute}: {}", session.show(attribute))?;
            }
            let mut screen = Vec::new();
            session.read_to_end(&mut screen)?;
            stdout.write_all(&screen)?;
            stdout.flush()?;
        }
    }

    device.into_inner().uninitialize();
    info!("lcdchar stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_are_split_on_the_first_equals_sign() {
        assert_eq!(
            parse_assignment("position=3:1"),
            Ok((Attribute::Position, "3:1".to_string()))
        );
        assert_eq!(
            parse_assignment("textflow=left=right"),
            Ok((Attribute::Textflow, "left=right".to_string()))
        );
        assert!(parse_assignment("display").is_err());
        assert!(parse_assignment("contrast=on").is_err());
    }

    #[test]
    fn command_line() {
        let cli = Cli::try_parse_from([
            "lcdchar",
            "--mock",
            "--set",
            "cursor=off",
            "--set",
            "position=0:1",
            "--no-banner",
        ])
        .unwrap();

        assert!(cli.mock);
        assert!(cli.no_banner);
        assert!(!cli.show);
        assert_eq!(
            cli.set,
            vec![
                (Attribute::Cursor, "off".to_string()),
                (Attribute::Position, "0:1".to_string()),
            ]
        );
    }

    fn banner_snapshot(geometry: Geometry) -> Vec<u8> {
        let gpio = MockGpioDriver::new(8);
        let bus = BusConfig::new_4bit(0, None, 1, [2, 3, 4, 5]);
        let mut lcd = hd44780::initialize(&gpio, &bus, geometry).unwrap();
        lcd.write(&banner(geometry.columns()));
        lcd.screen().snapshot()
    }

    #[test]
    fn banner_on_a_twenty_column_display() {
        assert_eq!(
            banner_snapshot(Geometry::new(20, 2).unwrap()),
            b"  *     LCD     *   \n  * initialized *   \n".to_vec()
        );
    }

    #[test]
    fn banner_fits_the_default_geometry() {
        let geometry = Config::default().geometry().unwrap();
        assert_eq!((geometry.columns(), geometry.rows()), (16, 2));
        assert_eq!(
            banner_snapshot(geometry),
            b"*     LCD     * \n* initialized * \n".to_vec()
        );
    }

    #[test]
    fn banner_is_cut_on_narrow_displays() {
        assert_eq!(
            banner_snapshot(Geometry::new(8, 2).unwrap()),
            b"*     LC\n* initia\n".to_vec()
        );
    }
}
