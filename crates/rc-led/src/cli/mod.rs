//! CLI subcommands — run the controller, query the policy, exercise the LED.

mod check;
mod config_cmd;
mod decide;
mod run;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use rc_led_lib::config::{Config, DriverKind};
pub(super) use rc_led_lib::error::{RcLedError, Result};
pub(super) use rc_led_lib::led::{Color, DriverError, GpioLed, LogPin, OutputDriver, SysfsPin};
pub(super) use rc_led_lib::signal::{DriveMode, LedMode, SpeedZone};

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// `#RRGGBB (name)`, or just `#RRGGBB` for unnamed colors.
pub(super) fn describe_color(color: Color) -> String {
    match color.name() {
        Some(name) => format!("{color} ({name})"),
        None => color.to_string(),
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct DecideOutput {
    pub mode: LedMode,
    pub drive_mode: DriveMode,
    pub speed_zone: SpeedZone,
    pub throttle: f32,
    pub color: String,
    pub name: Option<&'static str>,
    pub rgb: Color,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub errors: Vec<String>,
}

// ── Config & driver ──

/// Load config from `custom_path` or the platform default, logging parse warnings.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    let (config, warnings) = match custom_path {
        Some(p) => Config::load_from(p),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("[config] {w}");
    }
    config
}

/// Effective config file path.
pub(super) fn config_path(custom_path: Option<&Path>) -> Option<PathBuf> {
    custom_path.map(Path::to_path_buf).or_else(Config::path)
}

/// Reject a config that cannot drive the LED, listing every problem.
pub(super) fn ensure_valid(config: &Config) -> Result<()> {
    config.validate().map_err(|errors| {
        let list: Vec<String> = errors.iter().map(ToString::to_string).collect();
        RcLedError::Config(list.join("; "))
    })
}

/// The LED backend selected by config or `--dry-run`.
pub(super) enum Indicator {
    Gpio(GpioLed<SysfsPin>),
    DryRun(GpioLed<LogPin>),
}

impl Indicator {
    pub(super) fn open(config: &Config, dry_run: bool) -> Result<Self> {
        ensure_valid(config)?;
        if dry_run || config.driver == DriverKind::DryRun {
            return Ok(Indicator::DryRun(GpioLed::dry_run()));
        }
        let pins = config.pins;
        let led = GpioLed::open_sysfs(
            Path::new(&config.gpio_base),
            pins.red,
            pins.green,
            pins.blue,
        )?;
        Ok(Indicator::Gpio(led))
    }

    pub(super) fn describe(&self, config: &Config) -> String {
        match self {
            Indicator::Gpio(_) => format!(
                "gpio {} (red {}, green {}, blue {})",
                config.gpio_base, config.pins.red, config.pins.green, config.pins.blue
            ),
            Indicator::DryRun(_) => "dry-run (pin levels are logged)".into(),
        }
    }
}

impl OutputDriver for Indicator {
    fn set_color(&self, color: Color) -> std::result::Result<(), DriverError> {
        match self {
            Indicator::Gpio(led) => led.set_color(color),
            Indicator::DryRun(led) => led.set_color(color),
        }
    }

    fn set_blink(&self, frequency_hz: f64) {
        match self {
            Indicator::Gpio(led) => led.set_blink(frequency_hz),
            Indicator::DryRun(led) => led.set_blink(frequency_hz),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the indicator: read signals and drive the LED until Ctrl+C
    Run {
        /// Read events from this file instead of stdin
        #[arg(long, value_name = "FILE")]
        events: Option<PathBuf>,
        /// Color policy (overrides config): brake, speed_zone
        #[arg(long)]
        mode: Option<LedMode>,
        /// Log pin levels instead of driving GPIO
        #[arg(long)]
        dry_run: bool,
        /// Stop when the event stream ends
        #[arg(long)]
        exit_on_eof: bool,
    },

    /// Print the color chosen for a given signal state (no hardware required)
    Decide {
        /// Color policy: brake, speed_zone
        #[arg(long)]
        mode: LedMode,
        /// Drive mode: invalid, user, pilot
        #[arg(long)]
        drive_mode: DriveMode,
        /// Speed zone: unknown, slow, normal, fast
        #[arg(long, default_value = "unknown")]
        speed_zone: SpeedZone,
        /// Throttle in [-1.0, 1.0] (negative = braking)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        throttle: f32,
    },

    /// Cycle the LED through every named color, then turn it off
    Check {
        /// Log pin levels instead of driving GPIO
        #[arg(long)]
        dry_run: bool,
        /// Show only this color (name or #RRGGBB)
        #[arg(long)]
        color: Option<Color>,
        /// Seconds to hold each color
        #[arg(long, default_value_t = 1.0)]
        delay: f64,
    },

    /// Show current configuration and file path
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        Command::Run {
            events,
            mode,
            dry_run,
            exit_on_eof,
        } => {
            if json {
                warn_json_unsupported("run");
            }
            let config = load_config(config_path);
            run::cmd_run(&config, events.as_deref(), mode, dry_run, exit_on_eof)
        }
        Command::Decide {
            mode,
            drive_mode,
            speed_zone,
            throttle,
        } => decide::cmd_decide(mode, drive_mode, speed_zone, throttle, json),
        Command::Check {
            dry_run,
            color,
            delay,
        } => {
            if json {
                warn_json_unsupported("check");
            }
            let config = load_config(config_path);
            check::cmd_check(&config, dry_run, color, delay)
        }
        Command::Config => config_cmd::cmd_config(json, config_path),
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        let w = kv_width(&["A:"], &["blink_frequency:"]);
        // "blink_frequency:" = 16 + PADDING + 2 = 20
        assert_eq!(w, 20);
    }

    #[test]
    fn kv_width_empty_both() {
        assert_eq!(kv_width(&[], &[]), 0);
    }

    #[test]
    fn values_align_across_levels() {
        let w = kv_width(&["Config file:"], &["mode:"]);
        let top = format_kv("Config file:", "V", w);
        let indent = format!("  {:<width$}{}", "mode:", "V", width = w - 2);
        assert_eq!(top.find('V'), indent.find('V'));
    }

    #[test]
    fn format_kv_exact_width() {
        // Longer than the width: no padding added
        assert_eq!(format_kv("ExactWidth:", "val", 10), "ExactWidth:val");
    }

    #[test]
    fn describe_named_and_unnamed_colors() {
        assert_eq!(describe_color(Color::RED), "#FF0000 (red)");
        assert_eq!(describe_color(Color::new(1, 2, 3)), "#010203");
    }
}
