//! `config` subcommand — show current configuration and file path.

use std::path::Path;

use super::{Config, ConfigOutput, Result, kv, kv_indent, kv_width};

pub(super) fn cmd_config(json: bool, custom_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(custom_path);
    let config_path = super::config_path(custom_path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let errors: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errs) => errs.iter().map(ToString::to_string).collect(),
    };

    if json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            errors,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?
        );
        return Ok(());
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &[
            "mode:",
            "blink_frequency:",
            "driver:",
            "gpio_base:",
            "pins.red:",
            "pins.green:",
            "pins.blue:",
        ],
    );

    match &config_path {
        Some(p) => {
            if config_exists {
                kv("Config file:", format_args!("{} (loaded)", p.display()), w);
            } else {
                kv(
                    "Config file:",
                    format_args!("{} (not found, using defaults)", p.display()),
                    w,
                );
            }
        }
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    print_settings(&config, w);

    if !errors.is_empty() {
        println!();
        println!("Problems:");
        for e in &errors {
            println!("  {e}");
        }
    }
    Ok(())
}

fn print_settings(config: &Config, w: usize) {
    kv_indent("mode:", config.mode, w);
    kv_indent(
        "blink_frequency:",
        format_args!("{} Hz", config.blink_frequency),
        w,
    );
    kv_indent("driver:", config.driver, w);
    kv_indent("gpio_base:", &config.gpio_base, w);
    kv_indent("pins.red:", config.pins.red, w);
    kv_indent("pins.green:", config.pins.green, w);
    kv_indent("pins.blue:", config.pins.blue, w);
}
