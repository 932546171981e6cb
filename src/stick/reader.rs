use chrono::Local;
use num_traits::Float;
use std::marker::PhantomData;
use tracing::{debug, info, trace};

use crate::hal::{AnalogSampleProvider, Channel, DigitalLevelProvider, SAMPLE_MAX};
use crate::stick::error::StickError;
use crate::stick::reading::{angle_of, linear_of, magnitude_of, StickReading};

/// Deadzone used by [`StickReader::begin_default`].
pub const DEFAULT_DEADZONE: f64 = 0.1;

// Lifecycle markers
#[derive(Debug, Clone, Copy)]
pub struct Idle;

#[derive(Debug, Clone, Copy)]
pub struct Ready;

pub trait ReaderState: private::Sealed {}
impl ReaderState for Idle {}
impl ReaderState for Ready {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Idle {}
    impl Sealed for super::Ready {}
}

fn lit<P: Float>(value: f64) -> P {
    num_traits::cast(value).unwrap_or_else(P::zero)
}

// Map a raw sample onto [-1, 1], then cut and rescale the deadzone
fn normalize_sample<P: Float>(sample: u16, deadzone: P) -> P {
    let sample: P = lit(f64::from(sample.min(SAMPLE_MAX)));
    let full_scale: P = lit(f64::from(SAMPLE_MAX));
    let two: P = lit(2.0);

    let raw = (sample / full_scale) * two - P::one();
    let value = raw.abs();

    // raw == 0 always lands here, so the sign division below never sees 0
    if value <= deadzone {
        P::zero()
    } else {
        ((value - deadzone) / (P::one() - deadzone)) * (raw / value)
    }
}

/// Reader for a 2-axis analog stick with an optional push button.
///
/// `A` supplies analog samples, `D` digital levels, and `P` picks the
/// precision (`f32` or `f64`). A reader starts [`Idle`]; [`begin`] moves it
/// to [`Ready`], where the read methods live.
///
/// [`begin`]: StickReader::begin
#[derive(Debug)]
pub struct StickReader<A, D, P = f64, S = Ready> {
    analog: A,
    digital: D,

    x_channel: Channel,
    y_channel: Channel,
    button_channel: Option<Channel>,

    deadzone: P,

    // Set once a latched press has been reported, cleared on release
    latched: bool,

    state: PhantomData<S>,
}

// Methods available in every lifecycle state
impl<A, D, P: Float, S: ReaderState> StickReader<A, D, P, S> {
    /// `(x, y, button)` channel assignment.
    pub fn channels(&self) -> (Channel, Channel, Option<Channel>) {
        (self.x_channel, self.y_channel, self.button_channel)
    }

    pub fn has_button(&self) -> bool {
        self.button_channel.is_some()
    }

    pub fn deadzone(&self) -> P {
        self.deadzone
    }

    /// Give the providers back, e.g. to reuse a bus.
    pub fn release(self) -> (A, D) {
        (self.analog, self.digital)
    }
}

impl<A, D, P> StickReader<A, D, P, Idle>
where
    A: AnalogSampleProvider,
    D: DigitalLevelProvider,
    P: Float,
{
    pub fn new(
        analog: A,
        digital: D,
        x_channel: Channel,
        y_channel: Channel,
        button_channel: Option<Channel>,
    ) -> Self {
        debug!(
            "Creating stick reader: x={}, y={}, button={:?}",
            x_channel, y_channel, button_channel
        );
        Self {
            analog,
            digital,
            x_channel,
            y_channel,
            button_channel,
            deadzone: lit(DEFAULT_DEADZONE),
            latched: false,
            state: PhantomData,
        }
    }

    /// Store the deadzone and put the button pin into input mode.
    ///
    /// The deadzone is expected in `[0, 1)` and is not checked here; use
    /// [`StickConfig::validate`](crate::config::StickConfig::validate) for
    /// values coming from outside.
    pub fn begin(mut self, deadzone: P) -> Result<StickReader<A, D, P, Ready>, StickError> {
        if let Some(button) = self.button_channel {
            debug!("Configuring button {} as input", button);
            self.digital.configure_input_mode(button)?;
        }

        info!(
            "Stick reader ready (x={}, y={}, button={:?}, deadzone={:.3})",
            self.x_channel,
            self.y_channel,
            self.button_channel,
            deadzone.to_f64().unwrap_or_default()
        );

        Ok(StickReader {
            analog: self.analog,
            digital: self.digital,
            x_channel: self.x_channel,
            y_channel: self.y_channel,
            button_channel: self.button_channel,
            deadzone,
            latched: false,
            state: PhantomData,
        })
    }

    /// [`begin`](Self::begin) with a deadzone of 0.1.
    pub fn begin_default(self) -> Result<StickReader<A, D, P, Ready>, StickError> {
        self.begin(lit(DEFAULT_DEADZONE))
    }
}

impl<A, D, P> StickReader<A, D, P, Ready>
where
    A: AnalogSampleProvider,
    D: DigitalLevelProvider,
    P: Float,
{
    fn axis(&mut self, channel: Channel) -> P {
        let sample = self.analog.read_sample(channel);
        trace!("Sample {} = {}", channel, sample);
        normalize_sample(sample, self.deadzone)
    }

    /// Current x position in `[-1, 1]`, sampled fresh.
    pub fn x(&mut self) -> P {
        self.axis(self.x_channel)
    }

    /// Current y position in `[-1, 1]`, sampled fresh.
    pub fn y(&mut self) -> P {
        self.axis(self.y_channel)
    }

    /// Distance from center, `[0, √2]`. Samples both axes again.
    pub fn magnitude(&mut self) -> P {
        let (x, y) = (self.x(), self.y());
        magnitude_of(x, y)
    }

    /// Distance from center clamped to `[0, 1]`.
    pub fn linear(&mut self) -> P {
        let (x, y) = (self.x(), self.y());
        linear_of(x, y)
    }

    /// Direction in degrees, `[0, 360)`, 0° toward +y and clockwise.
    pub fn angle(&mut self) -> P {
        let (x, y) = (self.x(), self.y());
        angle_of(x, y)
    }

    /// Sample both axes once and derive every quantity from that pair.
    pub fn read(&mut self) -> StickReading<P> {
        let (x, y) = (self.x(), self.y());
        StickReading::from_axes(x, y, Local::now())
    }

    /// Whether the button is held down (active-low).
    ///
    /// With `latch` set, a press is reported once and then suppressed until
    /// the button has been released.
    pub fn pressed(&mut self, latch: bool) -> Result<bool, StickError> {
        let button = self.button_channel.ok_or_else(|| {
            StickError::InvalidConfiguration("stick reader has no button channel".to_string())
        })?;

        let down = !self.digital.read_level(button);

        if !down {
            if self.latched {
                debug!("Button {} released, latch cleared", button);
            }
            self.latched = false;
            return Ok(false);
        }

        if !latch {
            return Ok(true);
        }

        if self.latched {
            Ok(false)
        } else {
            debug!("Button {} pressed, latching", button);
            self.latched = true;
            Ok(true)
        }
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::simulated::SimulatedBoard;
    use crate::hal::SAMPLE_CENTER;
    use approx::assert_relative_eq;

    const X: Channel = Channel(0);
    const Y: Channel = Channel(1);
    const BUTTON: Channel = Channel(17);

    fn ready_reader<P: Float>(
        board: &SimulatedBoard,
        deadzone: P,
    ) -> StickReader<SimulatedBoard, SimulatedBoard, P> {
        StickReader::new(board.clone(), board.clone(), X, Y, Some(BUTTON))
            .begin(deadzone)
            .unwrap()
    }

    #[test]
    fn test_axis_output_in_unit_range_for_all_samples() {
        for deadzone in [0.0_f64, 0.1, 0.5, 0.95] {
            for sample in 0..=SAMPLE_MAX {
                let value = normalize_sample(sample, deadzone);
                assert!(
                    (-1.0..=1.0).contains(&value),
                    "sample {} with deadzone {} gave {}",
                    sample,
                    deadzone,
                    value
                );
            }
        }
    }

    #[test]
    fn test_axis_full_scale_reaches_extremes() {
        assert_eq!(normalize_sample(1023, 0.1_f64), 1.0);
        assert_eq!(normalize_sample(0, 0.1_f64), -1.0);
        assert_eq!(normalize_sample(1023, 0.25_f32), 1.0);
        assert_eq!(normalize_sample(0, 0.25_f32), -1.0);
    }

    #[test]
    fn test_mid_scale_is_near_zero_without_deadzone() {
        assert!(normalize_sample(511, 0.0_f64).abs() < 0.001);
        assert!(normalize_sample(512, 0.0_f64).abs() < 0.001);
        assert!(normalize_sample(511, 0.0_f64) < 0.0);
        assert!(normalize_sample(512, 0.0_f64) > 0.0);
    }

    #[test]
    fn test_inside_deadzone_is_exactly_zero() {
        let deadzone = 0.2_f64;
        for sample in 0..=SAMPLE_MAX {
            let raw = (f64::from(sample) / 1023.0) * 2.0 - 1.0;
            if raw.abs() <= deadzone {
                assert_eq!(normalize_sample(sample, deadzone), 0.0, "sample {}", sample);
            } else {
                assert_ne!(normalize_sample(sample, deadzone), 0.0, "sample {}", sample);
            }
        }
    }

    #[test]
    fn test_continuous_at_deadzone_boundary() {
        let deadzone = 0.1_f64;
        // First sample outside the deadzone on either side
        let above = (0..=SAMPLE_MAX)
            .find(|&s| s > SAMPLE_CENTER && normalize_sample(s, deadzone) != 0.0)
            .unwrap();
        let below = (0..=SAMPLE_MAX)
            .rev()
            .find(|&s| s < SAMPLE_CENTER && normalize_sample(s, deadzone) != 0.0)
            .unwrap();

        let step = 2.0 / 1023.0 / (1.0 - deadzone);
        assert!(normalize_sample(above, deadzone) > 0.0);
        assert!(normalize_sample(above, deadzone) <= step);
        assert!(normalize_sample(below, deadzone) < 0.0);
        assert!(normalize_sample(below, deadzone) >= -step);
    }

    #[test]
    fn test_out_of_range_sample_is_clamped() {
        assert_eq!(normalize_sample(4095, 0.1_f64), 1.0);
    }

    #[test]
    fn test_begin_configures_button_input() {
        let board = SimulatedBoard::new();
        let reader = ready_reader(&board, 0.1_f64);
        assert_eq!(board.configured_inputs(), vec![BUTTON]);
        assert_relative_eq!(reader.deadzone(), 0.1);
        assert!(reader.has_button());
        assert_eq!(reader.channels(), (X, Y, Some(BUTTON)));
    }

    #[test]
    fn test_begin_without_button_configures_nothing() {
        let board = SimulatedBoard::new();
        let _reader: StickReader<_, _, f32> =
            StickReader::new(board.clone(), board.clone(), X, Y, None)
                .begin_default()
                .unwrap();
        assert!(board.configured_inputs().is_empty());
    }

    #[test]
    fn test_begin_default_uses_tenth_deadzone() {
        let board = SimulatedBoard::new();
        let reader: StickReader<_, _, f64> =
            StickReader::new(board.clone(), board.clone(), X, Y, None)
                .begin_default()
                .unwrap();
        assert_eq!(reader.deadzone(), 0.1);
    }

    #[test]
    fn test_begin_surfaces_pin_failure() {
        let board = SimulatedBoard::new();
        board.break_pin(BUTTON);
        let result = StickReader::<_, _, f64, Idle>::new(board.clone(), board.clone(), X, Y, Some(BUTTON))
            .begin(0.1);
        assert!(matches!(result, Err(StickError::Hal(_))));
    }

    #[test]
    fn test_concrete_right_deflection() {
        let board = SimulatedBoard::new();
        board.set_sample(X, 1023);
        board.set_sample(Y, 511);
        let mut reader = ready_reader(&board, 0.1_f64);

        assert_eq!(reader.x(), 1.0);
        assert_eq!(reader.y(), 0.0);
        assert_eq!(reader.magnitude(), 1.0);
        assert_eq!(reader.linear(), 1.0);
        assert_relative_eq!(reader.angle(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_diagonal_magnitude_exceeds_one_but_linear_does_not() {
        let board = SimulatedBoard::new();
        board.set_sample(X, 1023);
        board.set_sample(Y, 1023);
        let mut reader = ready_reader(&board, 0.1_f32);

        assert_relative_eq!(reader.magnitude(), 2.0_f32.sqrt(), epsilon = 1e-6);
        assert_eq!(reader.linear(), 1.0);
        assert_relative_eq!(reader.angle(), 45.0, epsilon = 1e-4);
    }

    #[test]
    fn test_centered_stick_angle_is_zero() {
        let board = SimulatedBoard::new();
        let mut reader = ready_reader(&board, 0.1_f64);
        assert_eq!(reader.angle(), 0.0);
        assert_eq!(reader.magnitude(), 0.0);
    }

    #[test]
    fn test_angle_always_in_range() {
        let board = SimulatedBoard::new();
        let mut reader = ready_reader(&board, 0.05_f64);
        for x in (0..=SAMPLE_MAX).step_by(31) {
            for y in (0..=SAMPLE_MAX).step_by(31) {
                board.set_sample(X, x);
                board.set_sample(Y, y);
                let angle = reader.angle();
                assert!((0.0..360.0).contains(&angle), "({}, {}) gave {}", x, y, angle);
            }
        }
    }

    #[test]
    fn test_angle_keeps_rotated_orientation() {
        let board = SimulatedBoard::new();
        let mut reader = ready_reader(&board, 0.1_f64);

        // Full +y is 0°, full -x is 270°
        board.set_sample(X, SAMPLE_CENTER);
        board.set_sample(Y, 1023);
        assert_relative_eq!(reader.angle(), 0.0, epsilon = 1e-9);

        board.set_sample(X, 0);
        board.set_sample(Y, SAMPLE_CENTER);
        assert_relative_eq!(reader.angle(), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_every_accessor_samples_fresh() {
        let board = SimulatedBoard::new();
        let mut reader = ready_reader(&board, 0.1_f64);

        reader.x();
        reader.y();
        assert_eq!(board.sample_reads(), 2);
        reader.magnitude();
        assert_eq!(board.sample_reads(), 4);
        reader.angle();
        reader.linear();
        assert_eq!(board.sample_reads(), 8);
    }

    #[test]
    fn test_read_uses_one_sample_pair() {
        let board = SimulatedBoard::new();
        // The stick moves between every conversion
        board.script_samples(X, [1023, 0]);
        board.script_samples(Y, [SAMPLE_CENTER, SAMPLE_CENTER]);
        let mut reader = ready_reader(&board, 0.1_f64);

        let reading = reader.read();
        assert_eq!(board.sample_reads(), 2);
        assert_eq!(reading.x, 1.0);
        assert_eq!(reading.y, 0.0);
        assert_eq!(reading.magnitude, 1.0);
        assert_relative_eq!(reading.angle, 90.0, epsilon = 1e-9);

        // The stick has moved to the far left in the meantime
        assert_eq!(reader.x(), -1.0);
    }

    #[test]
    fn test_latched_press_fires_once_per_press() {
        let board = SimulatedBoard::new();
        let mut reader = ready_reader(&board, 0.1_f64);

        board.set_button(BUTTON, true);
        let held_first = reader.pressed(true).unwrap();
        let held_second = reader.pressed(true).unwrap();

        board.set_button(BUTTON, false);
        let released = reader.pressed(true).unwrap();

        board.set_button(BUTTON, true);
        let pressed_again = reader.pressed(true).unwrap();

        assert_eq!(
            vec![held_first, held_second, released, pressed_again],
            vec![true, false, false, true]
        );
    }

    #[test]
    fn test_unlatched_press_is_level_triggered() {
        let board = SimulatedBoard::new();
        let mut reader = ready_reader(&board, 0.1_f64);

        board.set_button(BUTTON, true);
        assert!(reader.pressed(false).unwrap());
        assert!(reader.pressed(false).unwrap());
        assert!(!reader.is_latched());

        board.set_button(BUTTON, false);
        assert!(!reader.pressed(false).unwrap());
    }

    #[test]
    fn test_button_is_active_low() {
        let board = SimulatedBoard::new();
        let mut reader = ready_reader(&board, 0.1_f64);

        board.set_level(BUTTON, true);
        assert!(!reader.pressed(false).unwrap());
        board.set_level(BUTTON, false);
        assert!(reader.pressed(false).unwrap());
    }

    #[test]
    fn test_release_clears_latch_set_earlier() {
        let board = SimulatedBoard::new();
        let mut reader = ready_reader(&board, 0.1_f64);

        board.set_button(BUTTON, true);
        assert!(reader.pressed(true).unwrap());
        assert!(reader.is_latched());

        // Unlatched polling while held does not touch the latch
        assert!(reader.pressed(false).unwrap());
        assert!(reader.is_latched());
        assert!(!reader.pressed(true).unwrap());

        board.set_button(BUTTON, false);
        assert!(!reader.pressed(false).unwrap());
        assert!(!reader.is_latched());
    }

    #[test]
    fn test_pressed_without_button_is_invalid_configuration() {
        let board = SimulatedBoard::new();
        let mut reader: StickReader<_, _, f64> =
            StickReader::new(board.clone(), board.clone(), X, Y, None)
                .begin(0.1)
                .unwrap();

        let err = reader.pressed(false).unwrap_err();
        assert!(matches!(err, StickError::InvalidConfiguration(_)));
        assert_eq!(board.level_reads(), 0);
    }

    #[test]
    fn test_release_returns_providers() {
        let board = SimulatedBoard::new();
        let reader = ready_reader(&board, 0.1_f64);
        let (mut analog, _digital) = reader.release();
        board.set_sample(X, 800);
        assert_eq!(analog.read_sample(X), 800);
    }
}
