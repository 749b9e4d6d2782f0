//! RGB color value used as color policy output.
//!
//! Colors are immutable triples of 8-bit channel intensities. Named constants
//! cover every color the policy can produce.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An RGB color. Equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

const NAMED: [(&str, Color); 7] = [
    ("black", Color::BLACK),
    ("red", Color::RED),
    ("green", Color::GREEN),
    ("blue", Color::BLUE),
    ("yellow", Color::YELLOW),
    ("white", Color::WHITE),
    ("purple", Color::PURPLE),
];

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const PURPLE: Color = Color::new(255, 0, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Color { red, green, blue }
    }

    /// True when every channel is off.
    pub fn is_black(&self) -> bool {
        *self == Color::BLACK
    }

    /// Name of the matching named constant, if any.
    pub fn name(&self) -> Option<&'static str> {
        NAMED
            .iter()
            .find(|(_, c)| c == self)
            .map(|(name, _)| *name)
    }

    /// All named colors, in display order.
    pub fn named() -> impl Iterator<Item = (&'static str, Color)> {
        NAMED.iter().copied()
    }

    /// Parse a color string.
    ///
    /// Accepts:
    /// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
    /// - Named: `"black"`/`"off"`, `"red"`, `"green"`, `"blue"`, `"yellow"`, `"white"`, `"purple"`
    pub fn parse(s: &str) -> crate::error::Result<Color> {
        let s = s.trim();

        let lower = s.to_lowercase();
        if lower == "off" {
            return Ok(Color::BLACK);
        }
        if let Some((_, c)) = NAMED.iter().find(|(name, _)| *name == lower) {
            return Ok(*c);
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            return Err(crate::RcLedError::Color(format!(
                "Invalid color: {s} (use #RRGGBB or a color name)"
            )));
        }
        let val = u32::from_str_radix(hex, 16)
            .map_err(|_| crate::RcLedError::Color(format!("Invalid hex color: {s}")))?;
        Ok(Color::new(
            ((val >> 16) & 0xFF) as u8,
            ((val >> 8) & 0xFF) as u8,
            (val & 0xFF) as u8,
        ))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl FromStr for Color {
    type Err = crate::RcLedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}
