//! # Hardware Abstraction
//!
//! The stick reader never touches pins directly. It talks to two collaborators:
//!
//! - [`AnalogSampleProvider`] - turns an analog channel into a raw 10-bit sample
//! - [`DigitalLevelProvider`] - reads a digital level and configures input mode
//!
//! ```text
//! StickReader ──► AnalogSampleProvider ──► ADC (x, y)
//!             └─► DigitalLevelProvider ──► GPIO (button)
//! ```
//!
//! Backends:
//! - [`simulated`] - in-memory board for tests and demos
//! - `rpi` - Raspberry Pi GPIO plus an MCP3008 SPI ADC (feature `rpi`)

#[cfg(feature = "rpi")]
pub mod rpi;
pub mod simulated;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest value an analog provider may report (10-bit converter).
pub const SAMPLE_MAX: u16 = 1023;

/// Mid-scale sample, what a resting stick reports.
pub const SAMPLE_CENTER: u16 = 511;

/// Identifier of an analog or digital input (pin or ADC channel number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub u8);

impl Channel {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u8 {
        self.0
    }
}

impl From<u8> for Channel {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum HalError {
    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("SPI error: {0}")]
    Spi(String),

    #[error("Channel {channel} out of range (max {max})")]
    ChannelOutOfRange { channel: Channel, max: u8 },
}

/// Source of raw analog samples.
///
/// Implementations return a value in `0..=SAMPLE_MAX`. Reads are expected to be
/// fast and fixed-latency; a backend that cannot read reports a fallback sample
/// of its own choosing instead of failing.
pub trait AnalogSampleProvider {
    fn read_sample(&mut self, channel: Channel) -> u16;
}

/// Source of digital levels plus one-time input configuration.
///
/// `true` is a high level. Buttons are wired active-low, so a pressed
/// button reads `false`.
pub trait DigitalLevelProvider {
    fn read_level(&mut self, channel: Channel) -> bool;

    /// Put `channel` into input mode. Called once from `begin`.
    fn configure_input_mode(&mut self, channel: Channel) -> Result<(), HalError>;
}

impl<T: AnalogSampleProvider + ?Sized> AnalogSampleProvider for &mut T {
    fn read_sample(&mut self, channel: Channel) -> u16 {
        (**self).read_sample(channel)
    }
}

impl<T: DigitalLevelProvider + ?Sized> DigitalLevelProvider for &mut T {
    fn read_level(&mut self, channel: Channel) -> bool {
        (**self).read_level(channel)
    }

    fn configure_input_mode(&mut self, channel: Channel) -> Result<(), HalError> {
        (**self).configure_input_mode(channel)
    }
}

impl<T: AnalogSampleProvider + ?Sized> AnalogSampleProvider for Box<T> {
    fn read_sample(&mut self, channel: Channel) -> u16 {
        (**self).read_sample(channel)
    }
}

impl<T: DigitalLevelProvider + ?Sized> DigitalLevelProvider for Box<T> {
    fn read_level(&mut self, channel: Channel) -> bool {
        (**self).read_level(channel)
    }

    fn configure_input_mode(&mut self, channel: Channel) -> Result<(), HalError> {
        (**self).configure_input_mode(channel)
    }
}
