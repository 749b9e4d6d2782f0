//! `run` subcommand — drive the indicator from a stream of signal events.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use rc_led_lib::controller::Controller;
use rc_led_lib::event::LineEventSource;

use super::{Config, Indicator, LedMode, RUNNING, Result};

/// Open the event stream: `path`, or stdin when absent.
fn open_events(path: Option<&Path>) -> Result<Box<dyn BufRead + Send>> {
    match path {
        Some(p) => {
            let file = File::open(p).map_err(|e| {
                log::error!("[events] unable to open {}: {e}", p.display());
                e
            })?;
            println!("[events] {}", p.display());
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            println!("[events] stdin");
            Ok(Box::new(BufReader::new(io::stdin())))
        }
    }
}

pub(super) fn cmd_run(
    config: &Config,
    events: Option<&Path>,
    mode: Option<LedMode>,
    dry_run: bool,
    exit_on_eof: bool,
) -> Result<()> {
    let mode = mode.unwrap_or(config.mode);
    let led = Indicator::open(config, dry_run)?;
    println!("[driver] {}", led.describe(config));
    println!("[mode]   {mode}, blink {} Hz", config.blink_frequency);

    let reader = open_events(events)?;
    let mut source = LineEventSource::new(reader).on_eof(move || {
        if exit_on_eof {
            RUNNING.store(false, Ordering::SeqCst);
        } else {
            log::info!("[events] stream ended, waiting for Ctrl+C");
        }
    });

    let controller = Arc::new(Controller::with_blink_frequency(
        led,
        mode,
        config.blink_frequency,
    ));
    println!("Running. Press Ctrl+C to stop.");
    controller.start(&mut source, &RUNNING)?;

    // The reader has finished once the stream ended; a live stdin reader
    // is left behind.
    if exit_on_eof {
        source.join();
    }
    let state = controller.state();
    println!(
        "[shutdown] indicator off (last state: {} / {} / throttle {:.2} / record {})",
        state.drive_mode, state.speed_zone, state.throttle, state.record_enabled
    );
    Ok(())
}
