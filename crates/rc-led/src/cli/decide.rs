//! `decide` subcommand — evaluate the color policy without hardware.

use rc_led_lib::policy;

use super::{DecideOutput, DriveMode, LedMode, Result, SpeedZone, describe_color};

pub(super) fn cmd_decide(
    mode: LedMode,
    drive_mode: DriveMode,
    speed_zone: SpeedZone,
    throttle: f32,
    json: bool,
) -> Result<()> {
    let color = policy::decide(mode, drive_mode, speed_zone, throttle);

    if json {
        let output = DecideOutput {
            mode,
            drive_mode,
            speed_zone,
            throttle,
            color: color.to_string(),
            name: color.name(),
            rgb: color,
        };
        // NaN throttle serializes as null
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?
        );
        return Ok(());
    }

    println!("{}", describe_color(color));
    Ok(())
}
