//! `check` subcommand — cycle the LED through every named color.

use std::sync::atomic::Ordering;
use std::time::Duration;

use super::{Color, Config, Indicator, OutputDriver, RUNNING, RcLedError, Result, kv, kv_width};

pub(super) fn cmd_check(
    config: &Config,
    dry_run: bool,
    only: Option<Color>,
    delay: f64,
) -> Result<()> {
    let hold = Duration::try_from_secs_f64(delay)
        .map_err(|e| RcLedError::Parse(format!("Invalid delay {delay}: {e}")))?;
    let led = Indicator::open(config, dry_run)?;
    println!("[driver] {}", led.describe(config));

    let colors: Vec<(&str, Color)> = match only {
        Some(c) => vec![(c.name().unwrap_or("custom"), c)],
        None => Color::named().filter(|(_, c)| !c.is_black()).collect(),
    };
    let mut keys: Vec<&str> = colors.iter().map(|(name, _)| *name).collect();
    keys.push("black");
    let w = kv_width(&keys, &[]);

    let mut failed = 0;
    for (name, color) in colors {
        if !RUNNING.load(Ordering::SeqCst) {
            break;
        }
        match led.set_color(color) {
            Ok(()) => kv(name, color, w),
            Err(e) => {
                kv(name, format_args!("{color} FAILED: {e}"), w);
                failed += 1;
            }
        }
        std::thread::sleep(hold);
    }

    led.set_color(Color::BLACK)?;
    kv("black", Color::BLACK, w);

    if failed > 0 {
        log::warn!("{failed} color(s) could not be shown");
    }
    Ok(())
}
