//! Color policy — maps the current signals to the indicator color.
//!
//! Precedence, highest first:
//! 1. In [`LedMode::Brake`], a throttle at or below [`BRAKE_THRESHOLD`]
//!    selects a brake band color.
//! 2. In [`LedMode::Brake`], the drive mode selects the color.
//! 3. In [`LedMode::SpeedZone`], the drive mode selects the color, and under
//!    autopilot the speed zone does.

use crate::led::Color;
use crate::signal::{DriveMode, LedMode, SignalState, SpeedZone};

/// Throttle at or below this value counts as braking.
pub const BRAKE_THRESHOLD: f32 = -0.05;

/// Brake bands, strongest first: `(throttle upper bound, color)`.
const BRAKE_BANDS: [(f32, Color); 4] = [
    (-1.0, Color::PURPLE),
    (-0.6, Color::RED),
    (-0.4, Color::YELLOW),
    (BRAKE_THRESHOLD, Color::WHITE),
];

/// Decide the indicator color. Pure and total.
pub fn decide(mode: LedMode, drive_mode: DriveMode, speed_zone: SpeedZone, throttle: f32) -> Color {
    if mode == LedMode::Brake
        && let Some(color) = brake_color(throttle)
    {
        return color;
    }

    match (mode, drive_mode) {
        (_, DriveMode::Invalid) => Color::BLACK,
        (_, DriveMode::User) => Color::GREEN,
        (LedMode::Brake, DriveMode::Pilot) => Color::BLUE,
        (LedMode::SpeedZone, DriveMode::Pilot) => speed_zone_color(speed_zone),
    }
}

/// [`decide`] over a signal snapshot.
pub fn decide_state(mode: LedMode, state: &SignalState) -> Color {
    decide(mode, state.drive_mode, state.speed_zone, state.throttle)
}

/// Brake band for `throttle`, or `None` when not braking (NaN included).
pub fn brake_color(throttle: f32) -> Option<Color> {
    BRAKE_BANDS
        .iter()
        .find(|(bound, _)| throttle <= *bound)
        .map(|(_, color)| *color)
}

fn speed_zone_color(zone: SpeedZone) -> Color {
    match zone {
        SpeedZone::Unknown => Color::WHITE,
        SpeedZone::Slow => Color::RED,
        SpeedZone::Normal => Color::YELLOW,
        SpeedZone::Fast => Color::BLUE,
    }
}
