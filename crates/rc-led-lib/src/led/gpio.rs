//! GPIO backend — one digital output per color channel.
//!
//! A channel is driven high when its intensity is non-zero. [`GpioLed`]
//! keeps the restore color (the last color requested through
//! [`OutputDriver::set_color`]) and owns a [`BlinkEngine`] that toggles the
//! pins between off and that color.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{Color, DriverError, OutputDriver};
use crate::blink::{BlinkEngine, Strobe};

/// A single digital output line.
pub trait DigitalOutput: Send + Sync + 'static {
    fn set_level(&self, high: bool) -> Result<(), DriverError>;
}

// ── Sysfs pin ──

/// Linux sysfs GPIO pin (`/sys/class/gpio/gpioN`).
#[derive(Debug)]
pub struct SysfsPin {
    number: u32,
    value_path: PathBuf,
}

impl SysfsPin {
    pub const DEFAULT_BASE: &'static str = "/sys/class/gpio";

    /// Attempts made to configure the direction after exporting; the pin
    /// directory and its permissions appear asynchronously.
    const DIRECTION_ATTEMPTS: u32 = 10;
    const DIRECTION_RETRY: Duration = Duration::from_millis(20);

    /// Export `number` under the default sysfs root and configure it as an output.
    pub fn open(number: u32) -> Result<Self, DriverError> {
        Self::open_at(Path::new(Self::DEFAULT_BASE), number)
    }

    /// Export `number` under `base` and configure it as an output.
    ///
    /// An already exported pin is reused.
    pub fn open_at(base: &Path, number: u32) -> Result<Self, DriverError> {
        let dir = base.join(format!("gpio{number}"));
        if !dir.exists() {
            std::fs::write(base.join("export"), number.to_string())
                .map_err(|e| DriverError::Export(format!("gpio{number}: {e}")))?;
        }

        let mut attempt = 1;
        loop {
            match std::fs::write(dir.join("direction"), "out") {
                Ok(()) => break,
                Err(e) if attempt >= Self::DIRECTION_ATTEMPTS => {
                    return Err(DriverError::Export(format!(
                        "gpio{number}: set direction: {e}"
                    )));
                }
                Err(_) => {
                    attempt += 1;
                    std::thread::sleep(Self::DIRECTION_RETRY);
                }
            }
        }

        log::debug!("gpio{number} configured as output");
        Ok(SysfsPin {
            number,
            value_path: dir.join("value"),
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl DigitalOutput for SysfsPin {
    fn set_level(&self, high: bool) -> Result<(), DriverError> {
        let value = if high { "1" } else { "0" };
        std::fs::write(&self.value_path, value)
            .map_err(|e| DriverError::Write(format!("gpio{}: {e}", self.number)))
    }
}

// ── Dry-run pin ──

/// Output that only logs level changes. Used when no hardware is attached.
#[derive(Debug)]
pub struct LogPin {
    name: String,
    level: Mutex<Option<bool>>,
}

impl LogPin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Mutex::new(None),
        }
    }
}

impl DigitalOutput for LogPin {
    fn set_level(&self, high: bool) -> Result<(), DriverError> {
        let mut level = self.level.lock().unwrap_or_else(PoisonError::into_inner);
        if *level != Some(high) {
            log::info!("[{}] {}", self.name, if high { "high" } else { "low" });
            *level = Some(high);
        }
        Ok(())
    }
}

// ── RGB LED ──

struct Channel<P> {
    name: &'static str,
    pin: Mutex<P>,
}

impl<P: DigitalOutput> Channel<P> {
    fn new(name: &'static str, pin: P) -> Self {
        Self {
            name,
            pin: Mutex::new(pin),
        }
    }

    fn write(&self, intensity: u8) -> Result<(), DriverError> {
        let pin = self.pin.lock().unwrap_or_else(PoisonError::into_inner);
        pin.set_level(intensity != 0)
    }
}

struct LedState {
    /// Restore color: the last color requested by the controller.
    color: Color,
    /// Color currently on the pins, `None` after a failed write.
    applied: Option<Color>,
    /// True during the off half-phase of a blink.
    dark: bool,
}

struct Shared<P> {
    red: Channel<P>,
    green: Channel<P>,
    blue: Channel<P>,
    state: Mutex<LedState>,
}

impl<P: DigitalOutput> Shared<P> {
    fn state(&self) -> std::sync::MutexGuard<'_, LedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write all three channels, reporting the first failure.
    fn write(&self, color: Color) -> Result<(), DriverError> {
        let mut first_err = None;
        for (channel, intensity) in [
            (&self.red, color.red),
            (&self.green, color.green),
            (&self.blue, color.blue),
        ] {
            if let Err(e) = channel.write(intensity) {
                log::warn!("unable to set {} channel: {e}", channel.name);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn show(&self, state: &mut LedState, color: Color) -> Result<(), DriverError> {
        let result = self.write(color);
        state.applied = result.as_ref().ok().map(|_| color);
        result
    }

    fn set_color(&self, color: Color) -> Result<(), DriverError> {
        let mut state = self.state();
        state.color = color;
        if state.dark || state.applied == Some(color) {
            return Ok(());
        }
        self.show(&mut state, color)
    }
}

impl<P: DigitalOutput> Strobe for Shared<P> {
    fn dark(&self) {
        let mut state = self.state();
        state.dark = true;
        // Failures are already logged per channel; the cycle continues.
        let _ = self.show(&mut state, Color::BLACK);
    }

    fn light(&self) {
        let mut state = self.state();
        state.dark = false;
        let color = state.color;
        let _ = self.show(&mut state, color);
    }
}

/// RGB indicator driven by three digital outputs.
pub struct GpioLed<P: DigitalOutput> {
    shared: Arc<Shared<P>>,
    blink: BlinkEngine<Shared<P>>,
}

impl<P: DigitalOutput> GpioLed<P> {
    pub fn new(red: P, green: P, blue: P) -> Self {
        let shared = Arc::new(Shared {
            red: Channel::new("red", red),
            green: Channel::new("green", green),
            blue: Channel::new("blue", blue),
            state: Mutex::new(LedState {
                color: Color::BLACK,
                applied: None,
                dark: false,
            }),
        });
        let blink = BlinkEngine::new(Arc::clone(&shared));
        Self { shared, blink }
    }

    /// The restore color (last requested color, even while blinking dark).
    pub fn color(&self) -> Color {
        self.shared.state().color
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_blinking()
    }
}

impl GpioLed<SysfsPin> {
    /// Open three sysfs pins under `base`.
    pub fn open_sysfs(base: &Path, red: u32, green: u32, blue: u32) -> Result<Self, DriverError> {
        Ok(Self::new(
            SysfsPin::open_at(base, red)?,
            SysfsPin::open_at(base, green)?,
            SysfsPin::open_at(base, blue)?,
        ))
    }
}

impl GpioLed<LogPin> {
    pub fn dry_run() -> Self {
        Self::new(LogPin::new("red"), LogPin::new("green"), LogPin::new("blue"))
    }
}

impl<P: DigitalOutput> OutputDriver for GpioLed<P> {
    fn set_color(&self, color: Color) -> Result<(), DriverError> {
        self.shared.set_color(color)
    }

    fn set_blink(&self, frequency_hz: f64) {
        self.blink.set_frequency(frequency_hz);
    }
}

/// In-memory pins for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Recording pin. Clones share the same history, so a test can keep a
    /// handle after moving the pin into a [`GpioLed`].
    #[derive(Clone, Default)]
    pub struct MockPin {
        levels: Arc<Mutex<Vec<bool>>>,
        fail: Arc<AtomicBool>,
    }

    impl MockPin {
        pub fn new() -> Self {
            Self::default()
        }

        /// Last written level, if any.
        pub fn level(&self) -> Option<bool> {
            self.levels
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last()
                .copied()
        }

        /// Every level written so far.
        pub fn history(&self) -> Vec<bool> {
            self.levels.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        /// Make subsequent writes fail (or succeed again).
        pub fn fail_writes(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl DigitalOutput for MockPin {
        fn set_level(&self, high: bool) -> Result<(), DriverError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DriverError::Write("mock: write failure injected".into()));
            }
            self.levels
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(high);
            Ok(())
        }
    }

    /// Three mock pins plus helpers to read back the displayed color.
    #[derive(Clone, Default)]
    pub struct MockRgb {
        pub red: MockPin,
        pub green: MockPin,
        pub blue: MockPin,
    }

    impl MockRgb {
        pub fn new() -> Self {
            Self::default()
        }

        /// Build a LED wired to clones of these pins.
        pub fn led(&self) -> GpioLed<MockPin> {
            GpioLed::new(self.red.clone(), self.green.clone(), self.blue.clone())
        }

        /// Color currently shown (a high channel reads as 255).
        pub fn shown(&self) -> Color {
            let level = |p: &MockPin| if p.level().unwrap_or(false) { 255 } else { 0 };
            Color::new(level(&self.red), level(&self.green), level(&self.blue))
        }

        /// Total number of channel writes.
        pub fn write_count(&self) -> usize {
            self.red.history().len() + self.green.history().len() + self.blue.history().len()
        }
    }
}
