use chrono::{DateTime, Local};
use num_traits::Float;

/// Euclidean distance of `(x, y)` from the center, in `[0, √2]` for axis values.
pub fn magnitude_of<P: Float>(x: P, y: P) -> P {
    x.hypot(y)
}

/// Magnitude clamped to the unit range.
pub fn linear_of<P: Float>(x: P, y: P) -> P {
    magnitude_of(x, y).min(P::one())
}

/// Stick direction in degrees within `[0, 360)`.
///
/// The board this was built for mounts the stick rotated: `atan2(x, y)`
/// puts 0° on +y and grows clockwise toward +x. Keep the argument order.
pub fn angle_of<P: Float>(x: P, y: P) -> P {
    let full_turn: P = num_traits::cast(360.0_f64).unwrap_or_else(P::zero);
    let mut angle = x.atan2(y).to_degrees();
    if angle < P::zero() {
        angle = angle + full_turn;
    }
    // -ε + 360 can round up to exactly 360
    if angle >= full_turn {
        angle = angle - full_turn;
    }
    angle
}

/// Everything derived from one x/y sample pair.
///
/// The single-value accessors on the reader sample the axes again for every
/// call; a `StickReading` is consistent even while the stick is moving.
#[derive(Debug, Clone, Copy)]
pub struct StickReading<P> {
    pub x: P,
    pub y: P,
    pub magnitude: P,
    pub linear: P,
    pub angle: P,
    pub timestamp: DateTime<Local>,
}

impl<P: Float> StickReading<P> {
    pub fn from_axes(x: P, y: P, timestamp: DateTime<Local>) -> Self {
        Self {
            x,
            y,
            magnitude: magnitude_of(x, y),
            linear: linear_of(x, y),
            angle: angle_of(x, y),
            timestamp,
        }
    }

    /// True when both axes sit inside the deadzone.
    pub fn is_centered(&self) -> bool {
        self.x == P::zero() && self.y == P::zero()
    }
}
