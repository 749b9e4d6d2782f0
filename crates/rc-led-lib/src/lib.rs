//! rc-led — indicator light controller for remote-controlled vehicles.

pub mod blink;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod led;
pub mod policy;
pub mod signal;

pub use error::RcLedError;
