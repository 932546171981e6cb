//! Stick subsystem: turns raw samples into stick positions
//!
//! 1. [`reader`] - channel ownership, deadzone, latch, lifecycle
//! 2. [`reading`] - magnitude/linear/angle math on normalized axes
//! 3. [`error`] - reader errors
//!
//! ```text
//! ADC sample ──► normalize ──► deadzone ──► x / y ──► magnitude, linear, angle
//! GPIO level ──► active-low ──► latch ──► pressed
//! ```

pub mod error;
pub mod reader;
pub mod reading;

pub use error::StickError;
pub use reader::{Idle, Ready, ReaderState, StickReader, DEFAULT_DEADZONE};
pub use reading::{angle_of, linear_of, magnitude_of, StickReading};
