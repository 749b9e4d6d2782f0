//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::controller::DEFAULT_BLINK_FREQUENCY;
use crate::led::SysfsPin;
use crate::signal::LedMode;

/// Which output backend drives the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    /// Linux sysfs GPIO pins.
    #[default]
    Gpio,
    /// Log pin levels instead of touching hardware.
    DryRun,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriverKind::Gpio => "gpio",
            DriverKind::DryRun => "dry-run",
        })
    }
}

/// GPIO line numbers of the three color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pins {
    #[serde(default = "default_red_pin")]
    pub red: u32,
    #[serde(default = "default_green_pin")]
    pub green: u32,
    #[serde(default = "default_blue_pin")]
    pub blue: u32,
}

// BCM numbers of header pins 16, 18 and 22.
fn default_red_pin() -> u32 {
    23
}
fn default_green_pin() -> u32 {
    24
}
fn default_blue_pin() -> u32 {
    25
}

impl Default for Pins {
    fn default() -> Self {
        Pins {
            red: default_red_pin(),
            green: default_green_pin(),
            blue: default_blue_pin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Color policy. Default: "brake". Values: "brake", "speed_zone".
    #[serde(default)]
    pub mode: LedMode,

    /// Blink rate (Hz) while recording. Default: 2.0.
    #[serde(default = "default_blink_frequency")]
    pub blink_frequency: f64,

    /// Output backend. Default: "gpio". Values: "gpio", "dry-run".
    #[serde(default)]
    pub driver: DriverKind,

    /// Sysfs GPIO root. Default: "/sys/class/gpio".
    #[serde(default = "default_gpio_base")]
    pub gpio_base: String,

    /// Channel pins.
    #[serde(default)]
    pub pins: Pins,
}

fn default_blink_frequency() -> f64 {
    DEFAULT_BLINK_FREQUENCY
}
fn default_gpio_base() -> String {
    SysfsPin::DEFAULT_BASE.into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: LedMode::default(),
            blink_frequency: default_blink_frequency(),
            driver: DriverKind::default(),
            gpio_base: default_gpio_base(),
            pins: Pins::default(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `blink_frequency` is not a positive finite number.
    InvalidBlinkFrequency(f64),
    /// Two channels share the same pin.
    DuplicatePin(u32),
    /// `gpio_base` is empty while the GPIO driver is selected.
    EmptyGpioBase,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBlinkFrequency(v) => {
                write!(f, "Invalid blink_frequency: {v} (must be > 0)")
            }
            ValidationError::DuplicatePin(p) => {
                write!(f, "Pin {p} is assigned to more than one channel")
            }
            ValidationError::EmptyGpioBase => write!(f, "gpio_base cannot be empty"),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rc-led"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !(self.blink_frequency.is_finite() && self.blink_frequency > 0.0) {
            errors.push(ValidationError::InvalidBlinkFrequency(self.blink_frequency));
        }

        let Pins { red, green, blue } = self.pins;
        if red == green || red == blue {
            errors.push(ValidationError::DuplicatePin(red));
        } else if green == blue {
            errors.push(ValidationError::DuplicatePin(green));
        }

        if self.driver == DriverKind::Gpio && self.gpio_base.trim().is_empty() {
            errors.push(ValidationError::EmptyGpioBase);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
