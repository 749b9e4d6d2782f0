//! Unified error type for the rc-led-lib crate.
//!
//! [`RcLedError`] wraps module-specific errors (`DriverError`,
//! `RegistrationError`, `DecodeError`) and domain-specific error kinds
//! (`Parse`, `Config`, `Color`). `From` impls allow `?` to propagate across module
//! boundaries seamlessly.

use std::fmt;

use crate::event::{DecodeError, RegistrationError};
use crate::led::DriverError;

/// Unified error type for rc-led-lib operations.
#[derive(Debug)]
pub enum RcLedError {
    /// Output driver error (pin export, level write).
    Driver(DriverError),
    /// Event source subscription error.
    Registration(RegistrationError),
    /// Malformed inbound event.
    Decode(DecodeError),
    /// Standard I/O error (event file, sysfs).
    Io(std::io::Error),
    /// Unrecognized signal or mode value (CLI flags, event values).
    Parse(String),
    /// Configuration validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
}

impl fmt::Display for RcLedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RcLedError::Driver(e) => write!(f, "{e}"),
            RcLedError::Registration(e) => write!(f, "{e}"),
            RcLedError::Decode(e) => write!(f, "{e}"),
            RcLedError::Io(e) => write!(f, "I/O error: {e}"),
            RcLedError::Parse(e) => write!(f, "{e}"),
            RcLedError::Config(e) => write!(f, "Config error: {e}"),
            RcLedError::Color(e) => write!(f, "Color error: {e}"),
        }
    }
}

impl std::error::Error for RcLedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RcLedError::Driver(e) => Some(e),
            RcLedError::Registration(e) => Some(e),
            RcLedError::Decode(e) => Some(e),
            RcLedError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DriverError> for RcLedError {
    fn from(e: DriverError) -> Self {
        RcLedError::Driver(e)
    }
}

impl From<RegistrationError> for RcLedError {
    fn from(e: RegistrationError) -> Self {
        RcLedError::Registration(e)
    }
}

impl From<DecodeError> for RcLedError {
    fn from(e: DecodeError) -> Self {
        RcLedError::Decode(e)
    }
}

impl From<std::io::Error> for RcLedError {
    fn from(e: std::io::Error) -> Self {
        RcLedError::Io(e)
    }
}

/// Crate-level Result alias using [`RcLedError`].
pub type Result<T> = std::result::Result<T, RcLedError>;
