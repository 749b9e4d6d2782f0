//! Input signals and the controller's operating mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RcLedError;

/// Who is driving the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    /// No drive mode received yet.
    #[default]
    Invalid,
    /// Manual control.
    User,
    /// Autonomous control.
    Pilot,
}

/// Coarse classification of the autopilot's target speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedZone {
    #[default]
    Unknown,
    Slow,
    Normal,
    Fast,
}

/// Operating mode of the controller, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedMode {
    /// Color reflects drive mode and braking.
    #[default]
    Brake,
    /// Color reflects drive mode and, under autopilot, the speed zone.
    SpeedZone,
}

/// Latest value of every input signal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SignalState {
    pub drive_mode: DriveMode,
    pub speed_zone: SpeedZone,
    /// Signed throttle, negative values brake.
    pub throttle: f32,
    pub record_enabled: bool,
}

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for DriveMode {
    type Err = RcLedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "invalid" => Ok(DriveMode::Invalid),
            "user" => Ok(DriveMode::User),
            "pilot" => Ok(DriveMode::Pilot),
            _ => Err(RcLedError::Parse(format!(
                "Invalid drive mode: {s} (expected invalid, user or pilot)"
            ))),
        }
    }
}

impl FromStr for SpeedZone {
    type Err = RcLedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "unknown" => Ok(SpeedZone::Unknown),
            "slow" => Ok(SpeedZone::Slow),
            "normal" => Ok(SpeedZone::Normal),
            "fast" => Ok(SpeedZone::Fast),
            _ => Err(RcLedError::Parse(format!(
                "Invalid speed zone: {s} (expected unknown, slow, normal or fast)"
            ))),
        }
    }
}

impl FromStr for LedMode {
    type Err = RcLedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "brake" => Ok(LedMode::Brake),
            "speed_zone" | "speedzone" => Ok(LedMode::SpeedZone),
            _ => Err(RcLedError::Parse(format!(
                "Invalid mode: {s} (expected brake or speed_zone)"
            ))),
        }
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriveMode::Invalid => "invalid",
            DriveMode::User => "user",
            DriveMode::Pilot => "pilot",
        })
    }
}

impl fmt::Display for SpeedZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpeedZone::Unknown => "unknown",
            SpeedZone::Slow => "slow",
            SpeedZone::Normal => "normal",
            SpeedZone::Fast => "fast",
        })
    }
}

impl fmt::Display for LedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LedMode::Brake => "brake",
            LedMode::SpeedZone => "speed_zone",
        })
    }
}
