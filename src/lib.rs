//! Analog joystick reader.
//!
//! Converts raw 10-bit samples from a 2-axis stick into a normalized
//! position, a deadzone-filtered magnitude and a direction, and reads the
//! stick's push button with optional single-fire latching.
//!
//! ```
//! use stickreader::hal::simulated::SimulatedBoard;
//! use stickreader::hal::Channel;
//! use stickreader::stick::StickReader;
//!
//! let board = SimulatedBoard::new();
//! board.set_sample(Channel(0), 1023);
//!
//! let mut stick: StickReader<_, _, f32> =
//!     StickReader::new(board.clone(), board.clone(), Channel(0), Channel(1), Some(Channel(17)))
//!         .begin(0.1)
//!         .unwrap();
//!
//! assert_eq!(stick.x(), 1.0);
//! assert!((stick.angle() - 90.0).abs() < 1e-3);
//! ```

pub mod config;
pub mod hal;
pub mod stick;

pub use config::{ConfigError, StickConfig};
pub use hal::{AnalogSampleProvider, Channel, DigitalLevelProvider, HalError};
pub use stick::{StickError, StickReader, StickReading};
