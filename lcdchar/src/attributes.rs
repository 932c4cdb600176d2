//! Control attributes of the display, one text endpoint each.
//!
//! Reading an attribute renders the current state (`"on\n"`, `"right\n"`, `"3:1\n"`). Writing
//! one accepts any input and always reports it as fully consumed; input that doesn't start with a
//! recognized word is logged and ignored.

use lcdchar_gpio::lcd::hd44780::Lcd;
use lcdchar_gpio::lcd::hd44780::driver::{CursorDirection, HD44780Driver};
use log::{debug, warn};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

const POSITION_DELIMITERS: [char; 7] = [' ', '\n', '\r', ':', ';', ',', '.'];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Attribute {
    Display,
    Cursor,
    Blink,
    Autoscroll,
    Textflow,
    Scroll,
    Position,
}

impl Attribute {
    pub const ALL: [Attribute; 7] = [
        Attribute::Display,
        Attribute::Cursor,
        Attribute::Blink,
        Attribute::Autoscroll,
        Attribute::Textflow,
        Attribute::Scroll,
        Attribute::Position,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Display => "display",
            Attribute::Cursor => "cursor",
            Attribute::Blink => "blink",
            Attribute::Autoscroll => "autoscroll",
            Attribute::Textflow => "textflow",
            Attribute::Scroll => "scroll",
            Attribute::Position => "position",
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown attribute {0:?}")]
pub struct UnknownAttribute(String);

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|attribute| attribute.name() == s)
            .ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    /// Matches the leading word of `input`.
    pub fn parse(input: &str) -> Option<Self> {
        if input.starts_with("on") {
            Some(Switch::On)
        } else if input.starts_with("off") {
            Some(Switch::Off)
        } else {
            None
        }
    }

    fn show(on: bool) -> String {
        (if on { "on\n" } else { "off\n" }).to_string()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Matches the leading word of `input`.
    pub fn parse(input: &str) -> Option<Self> {
        if input.starts_with("right") {
            Some(Direction::Right)
        } else if input.starts_with("left") {
            Some(Direction::Left)
        } else {
            None
        }
    }
}

impl From<Direction> for CursorDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Left => CursorDirection::Left,
            Direction::Right => CursorDirection::Right,
        }
    }
}

/// Renders the current value of `attribute`.
pub fn show<D: HD44780Driver>(lcd: &Lcd<D>, attribute: Attribute) -> String {
    match attribute {
        Attribute::Display => Switch::show(lcd.is_display_on()),
        Attribute::Cursor => Switch::show(lcd.is_cursor_visible()),
        Attribute::Blink => Switch::show(lcd.is_blink_on()),
        Attribute::Autoscroll => Switch::show(lcd.is_autoscroll()),
        Attribute::Textflow if lcd.is_left_to_right() => "right\n".to_string(),
        Attribute::Textflow => "left\n".to_string(),
        Attribute::Scroll => "left/right\n".to_string(),
        Attribute::Position => {
            let position = lcd.cursor_position();
            format!("{}:{}\n", position.col, position.row)
        }
    }
}

/// Applies `input` to `attribute`. Returns the number of bytes consumed, which is always the
/// whole input.
pub fn store<D: HD44780Driver>(lcd: &mut Lcd<D>, attribute: Attribute, input: &str) -> usize {
    debug!("Storing {input:?} to {attribute}");
    match attribute {
        Attribute::Position => {
            let (col, row) = parse_position(input);
            lcd.set_cursor_position(col, row);
        }
        Attribute::Textflow | Attribute::Scroll => match Direction::parse(input) {
            Some(direction) => apply_direction(lcd, attribute, direction),
            None => warn!("Ignoring {input:?} written to {attribute}, expected left/right"),
        },
        _ => match Switch::parse(input) {
            Some(switch) => apply_switch(lcd, attribute, switch),
            None => warn!("Ignoring {input:?} written to {attribute}, expected on/off"),
        },
    }
    input.len()
}

fn apply_switch<D: HD44780Driver>(lcd: &mut Lcd<D>, attribute: Attribute, switch: Switch) {
    let on = switch == Switch::On;
    match attribute {
        Attribute::Display => lcd.set_display(on),
        Attribute::Cursor => lcd.set_cursor_visible(on),
        Attribute::Blink => lcd.set_blink(on),
        Attribute::Autoscroll => lcd.set_autoscroll(on),
        _ => warn!("{attribute} can't be switched on or off"),
    }
}

fn apply_direction<D: HD44780Driver>(
    lcd: &mut Lcd<D>,
    attribute: Attribute,
    direction: Direction,
) {
    match attribute {
        Attribute::Textflow => lcd.set_text_direction(direction.into()),
        Attribute::Scroll => lcd.scroll_display(direction.into()),
        _ => warn!("{attribute} has no direction"),
    }
}

/// Reads a column and a row from `input`. A token that is missing or not a number reads as 0.
pub fn parse_position(input: &str) -> (u8, u8) {
    let mut tokens = input.split(POSITION_DELIMITERS);
    let mut next = || {
        tokens
            .next()
            .and_then(|token| token.parse().ok())
            .unwrap_or(0)
    };
    let col = next();
    let row = next();
    (col, row)
}
