//! LED output — color values, the output driver boundary, GPIO backend.

mod color;
mod driver;
pub mod gpio;

pub use color::Color;
pub use driver::{DriverError, OutputDriver};
pub use gpio::{DigitalOutput, GpioLed, LogPin, SysfsPin};
