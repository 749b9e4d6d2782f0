//! LED controller — aggregates input signals and drives the indicator.
//!
//! [`Controller`] holds the latest value of every input signal behind one
//! mutex. Each color-relevant setter updates its field, evaluates the
//! [color policy](crate::policy) on the fresh snapshot and applies the result
//! to the output driver before releasing the lock, so at most one color
//! intent is in flight. The record flag drives the driver's blink overlay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::Result;
use crate::event::{EventSource, SignalKind, SignalSink};
use crate::led::{Color, OutputDriver};
use crate::policy;
use crate::signal::{DriveMode, LedMode, SignalState, SpeedZone};

/// Blink rate used while recording.
pub const DEFAULT_BLINK_FREQUENCY: f64 = 2.0;

/// How often [`Controller::start`] checks its running flag.
const IDLE_POLL: Duration = Duration::from_millis(100);

pub struct Controller<D: OutputDriver> {
    mode: LedMode,
    blink_frequency: f64,
    driver: D,
    state: Mutex<SignalState>,
    shut_down: AtomicBool,
}

impl<D: OutputDriver> Controller<D> {
    pub fn new(driver: D, mode: LedMode) -> Self {
        Self::with_blink_frequency(driver, mode, DEFAULT_BLINK_FREQUENCY)
    }

    pub fn with_blink_frequency(driver: D, mode: LedMode, blink_frequency: f64) -> Self {
        Self {
            mode,
            blink_frequency,
            driver,
            state: Mutex::new(SignalState::default()),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> LedMode {
        self.mode
    }

    pub fn blink_frequency(&self) -> f64 {
        self.blink_frequency
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Consistent snapshot of every signal.
    pub fn state(&self) -> SignalState {
        *self.lock()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Update the drive mode and apply the resulting color.
    pub fn set_drive_mode(&self, mode: DriveMode) -> Color {
        self.update(|s| s.drive_mode = mode)
    }

    /// Update the speed zone and apply the resulting color.
    pub fn set_speed_zone(&self, zone: SpeedZone) -> Color {
        self.update(|s| s.speed_zone = zone)
    }

    /// Update the throttle and apply the resulting color.
    pub fn set_throttle(&self, throttle: f32) -> Color {
        self.update(|s| s.throttle = throttle)
    }

    /// Update the record flag. Returns `true` if it changed.
    ///
    /// Enabling starts blinking at the configured rate, disabling stops it.
    /// Repeating the current value issues nothing to the driver.
    pub fn set_record_enabled(&self, enabled: bool) -> bool {
        let mut state = self.lock();
        if state.record_enabled == enabled {
            return false;
        }
        state.record_enabled = enabled;
        if self.is_shut_down() {
            return true;
        }
        if enabled {
            log::info!("record mode enabled");
            self.driver.set_blink(self.blink_frequency);
        } else {
            log::info!("record mode disabled");
            self.driver.set_blink(0.0);
        }
        true
    }

    /// Stop blinking and turn the indicator off. Idempotent.
    ///
    /// Setters keep updating the signal state afterwards but no longer
    /// touch the driver.
    pub fn shutdown(&self) {
        let _state = self.lock();
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        log::info!("stop led controller");
        self.driver.set_blink(0.0);
        if let Err(e) = self.driver.set_color(Color::BLACK) {
            log::warn!("unable to turn indicator off: {e}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut SignalState)) -> Color {
        let mut state = self.lock();
        apply(&mut state);
        let color = policy::decide_state(self.mode, &state);
        if self.is_shut_down() {
            log::debug!("controller shut down, {color} not applied");
        } else if let Err(e) = self.driver.set_color(color) {
            log::warn!("unable to set indicator to {color}: {e}");
        }
        color
    }
}

impl<D: OutputDriver + 'static> Controller<D> {
    /// Subscribe this controller to every signal of `source`, then connect it.
    ///
    /// On failure every subscription made so far is dropped.
    pub fn register(self: &Arc<Self>, source: &mut impl EventSource) -> Result<()> {
        for kind in SignalKind::ALL {
            let sink: Arc<dyn SignalSink> = Arc::clone(self) as Arc<dyn SignalSink>;
            if let Err(e) = source.subscribe(kind, sink) {
                source.unsubscribe_all();
                return Err(e.into());
            }
        }
        if let Err(e) = source.connect() {
            source.unsubscribe_all();
            return Err(e.into());
        }
        Ok(())
    }

    /// Register with `source` and idle until `running` turns false or
    /// [`shutdown`](Self::shutdown) is called, then unsubscribe and shut down.
    ///
    /// Registration failures are returned before anything is started.
    pub fn start(
        self: &Arc<Self>,
        source: &mut impl EventSource,
        running: &AtomicBool,
    ) -> Result<()> {
        self.register(source)?;
        log::info!("led controller started ({} mode)", self.mode);
        while running.load(Ordering::SeqCst) && !self.is_shut_down() {
            std::thread::sleep(IDLE_POLL);
        }
        source.unsubscribe_all();
        self.shutdown();
        Ok(())
    }
}

impl<D: OutputDriver> SignalSink for Controller<D> {
    fn on_drive_mode(&self, mode: DriveMode) {
        log::debug!("drive mode: {mode}");
        self.set_drive_mode(mode);
    }

    fn on_speed_zone(&self, zone: SpeedZone) {
        log::debug!("speed zone: {zone}");
        self.set_speed_zone(zone);
    }

    fn on_throttle(&self, throttle: f32) {
        self.set_throttle(throttle);
    }

    fn on_record(&self, enabled: bool) {
        self.set_record_enabled(enabled);
    }
}
