//! Output driver boundary — the capability set the controller drives.

use std::fmt;

use super::Color;

/// Output driver errors.
///
/// String payloads follow the convention **"context: details"** where
/// *context* names the pin or channel (e.g. `"gpio23"`, `"red"`) and
/// *details* describes what went wrong.
#[derive(Debug)]
pub enum DriverError {
    /// Pin could not be exported or configured as an output.
    Export(String),
    /// A level write was rejected.
    Write(String),
    /// Underlying I/O failure without more specific context.
    Io(std::io::Error),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Export(e) => write!(f, "Failed to export pin: {e}"),
            DriverError::Write(e) => write!(f, "Failed to write pin: {e}"),
            DriverError::Io(e) => write!(f, "Driver I/O error: {e}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e)
    }
}

/// A colored indicator light.
///
/// Implementations must serialize their own channel writes: the controller
/// and a blink worker may call in from different threads.
pub trait OutputDriver: Send + Sync {
    /// Show `color`. Fails when the hardware rejects a write.
    fn set_color(&self, color: Color) -> Result<(), DriverError>;

    /// Blink the current color at `frequency_hz`. A frequency `<= 0` stops
    /// blinking and leaves the current color lit.
    fn set_blink(&self, frequency_hz: f64);
}

impl<T: OutputDriver + ?Sized> OutputDriver for std::sync::Arc<T> {
    fn set_color(&self, color: Color) -> Result<(), DriverError> {
        (**self).set_color(color)
    }

    fn set_blink(&self, frequency_hz: f64) {
        (**self).set_blink(frequency_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_variants() {
        assert_eq!(
            DriverError::Export("gpio23: busy".into()).to_string(),
            "Failed to export pin: gpio23: busy"
        );
        assert_eq!(
            DriverError::Write("red: EIO".into()).to_string(),
            "Failed to write pin: red: EIO"
        );
    }

    #[test]
    fn io_error_is_source() {
        let e: DriverError = std::io::Error::other("bus fault").into();
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("bus fault"));
    }
}
