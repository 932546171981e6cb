//! In-memory board used by tests and demos.
//!
//! [`SimulatedBoard`] is a cheap clonable handle; every clone sees the same
//! pin table, so a test can hand one clone to a reader and keep moving the
//! stick through another.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

use super::{AnalogSampleProvider, Channel, DigitalLevelProvider, HalError, SAMPLE_CENTER, SAMPLE_MAX};

#[derive(Debug, Default)]
struct BoardState {
    samples: HashMap<Channel, u16>,
    // Queued samples are consumed one per read before falling back to `samples`
    scripted: HashMap<Channel, VecDeque<u16>>,
    levels: HashMap<Channel, bool>,
    configured: Vec<Channel>,
    broken_pins: HashSet<Channel>,
    sample_reads: usize,
    level_reads: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedBoard {
    state: Arc<Mutex<BoardState>>,
}

impl SimulatedBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        // A panicking test thread must not take the board down with it
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hold `channel` at `sample` until changed. Values above 1023 are kept
    /// as-is so out-of-range handling can be exercised.
    pub fn set_sample(&self, channel: Channel, sample: u16) {
        let mut state = self.state();
        state.scripted.remove(&channel);
        state.samples.insert(channel, sample);
    }

    /// Queue samples returned by successive reads of `channel`. The last one
    /// sticks once the queue runs dry.
    pub fn script_samples(&self, channel: Channel, samples: impl IntoIterator<Item = u16>) {
        let mut state = self.state();
        let queue: VecDeque<u16> = samples.into_iter().collect();
        if let Some(&last) = queue.back() {
            state.samples.insert(channel, last);
        }
        state.scripted.insert(channel, queue);
    }

    pub fn set_level(&self, channel: Channel, high: bool) {
        self.state().levels.insert(channel, high);
    }

    /// Drive an active-low button: pressed pulls the line low.
    pub fn set_button(&self, channel: Channel, pressed: bool) {
        self.set_level(channel, !pressed);
    }

    /// Make `configure_input_mode` fail for `channel`.
    pub fn break_pin(&self, channel: Channel) {
        self.state().broken_pins.insert(channel);
    }

    pub fn configured_inputs(&self) -> Vec<Channel> {
        self.state().configured.clone()
    }

    pub fn sample_reads(&self) -> usize {
        self.state().sample_reads
    }

    pub fn level_reads(&self) -> usize {
        self.state().level_reads
    }
}

impl AnalogSampleProvider for SimulatedBoard {
    fn read_sample(&mut self, channel: Channel) -> u16 {
        let mut state = self.state();
        state.sample_reads += 1;

        let scripted = state.scripted.get_mut(&channel).and_then(VecDeque::pop_front);
        let sample = scripted
            .or_else(|| state.samples.get(&channel).copied())
            .unwrap_or(SAMPLE_CENTER);

        trace!("Simulated sample {} = {} (max {})", channel, sample, SAMPLE_MAX);
        sample
    }
}

impl DigitalLevelProvider for SimulatedBoard {
    fn read_level(&mut self, channel: Channel) -> bool {
        let mut state = self.state();
        state.level_reads += 1;
        // Floating inputs idle high on a pulled-up board
        state.levels.get(&channel).copied().unwrap_or(true)
    }

    fn configure_input_mode(&mut self, channel: Channel) -> Result<(), HalError> {
        let mut state = self.state();
        if state.broken_pins.contains(&channel) {
            return Err(HalError::Gpio(format!("pin {} is not available", channel)));
        }

        debug!("Simulated board: {} configured as input", channel);
        state.configured.push(channel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_channels_rest_centered_and_released() {
        let mut board = SimulatedBoard::new();
        assert_eq!(board.read_sample(Channel(0)), SAMPLE_CENTER);
        assert!(board.read_level(Channel(5)));
    }

    #[test]
    fn test_clones_share_state() {
        let handle = SimulatedBoard::new();
        let mut reader_side = handle.clone();

        handle.set_sample(Channel(1), 1023);
        handle.set_button(Channel(4), true);

        assert_eq!(reader_side.read_sample(Channel(1)), 1023);
        assert!(!reader_side.read_level(Channel(4)));
        assert_eq!(handle.sample_reads(), 1);
        assert_eq!(handle.level_reads(), 1);
    }

    #[test]
    fn test_scripted_samples_then_hold_last() {
        let mut board = SimulatedBoard::new();
        board.script_samples(Channel(0), [0, 300, 900]);

        assert_eq!(board.read_sample(Channel(0)), 0);
        assert_eq!(board.read_sample(Channel(0)), 300);
        assert_eq!(board.read_sample(Channel(0)), 900);
        assert_eq!(board.read_sample(Channel(0)), 900);
    }

    #[test]
    fn test_set_sample_discards_script() {
        let mut board = SimulatedBoard::new();
        board.script_samples(Channel(0), [10, 20]);
        board.set_sample(Channel(0), 600);
        assert_eq!(board.read_sample(Channel(0)), 600);
    }

    #[test]
    fn test_configure_records_and_fails_on_broken_pin() {
        let mut board = SimulatedBoard::new();
        board.configure_input_mode(Channel(3)).unwrap();
        assert_eq!(board.configured_inputs(), vec![Channel(3)]);

        board.break_pin(Channel(6));
        let err = board.configure_input_mode(Channel(6)).unwrap_err();
        assert!(matches!(err, HalError::Gpio(_)));
        assert_eq!(board.configured_inputs(), vec![Channel(3)]);
    }
}
