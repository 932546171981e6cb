//! Raspberry Pi backend.
//!
//! The Pi has no analog inputs, so the stick axes go through an MCP3008
//! (8 channel, 10-bit SPI ADC). The button sits on a GPIO pin with the
//! internal pull-up enabled and shorts to ground when pressed.

use rppal::gpio::{Gpio, InputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use super::{AnalogSampleProvider, Channel, DigitalLevelProvider, HalError, SAMPLE_CENTER, SAMPLE_MAX};

/// Highest single-ended input on the MCP3008.
pub const MCP3008_MAX_CHANNEL: u8 = 7;

/// 1.35 MHz is the datasheet limit at 5V; stay below it at 3.3V.
pub const MCP3008_DEFAULT_CLOCK_HZ: u32 = 1_000_000;

// Start bit, then single-ended mode + channel in the upper nibble
fn encode_request(channel: u8) -> [u8; 3] {
    [0x01, (0x08 | channel) << 4, 0x00]
}

// Ten result bits: two in the second byte, eight in the third
fn decode_response(rx: &[u8; 3]) -> u16 {
    (((rx[1] & 0x03) as u16) << 8) | rx[2] as u16
}

pub struct Mcp3008 {
    spi: Spi,
}

impl Mcp3008 {
    pub fn new(spi: Spi) -> Self {
        Self { spi }
    }

    pub fn open(bus: Bus, slave_select: SlaveSelect, clock_hz: u32) -> Result<Self, HalError> {
        info!("Opening MCP3008 on {:?}/{:?} at {} Hz", bus, slave_select, clock_hz);
        let spi = Spi::new(bus, slave_select, clock_hz, Mode::Mode0).map_err(|e| {
            error!("Failed to open SPI bus: {}", e);
            HalError::Spi(e.to_string())
        })?;
        Ok(Self::new(spi))
    }

    /// Read one channel, reporting transfer problems instead of hiding them.
    pub fn try_read(&mut self, channel: Channel) -> Result<u16, HalError> {
        if channel.id() > MCP3008_MAX_CHANNEL {
            return Err(HalError::ChannelOutOfRange {
                channel,
                max: MCP3008_MAX_CHANNEL,
            });
        }

        let tx = encode_request(channel.id());
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HalError::Spi(e.to_string()))?;

        Ok(decode_response(&rx).min(SAMPLE_MAX))
    }
}

impl AnalogSampleProvider for Mcp3008 {
    fn read_sample(&mut self, channel: Channel) -> u16 {
        match self.try_read(channel) {
            Ok(sample) => sample,
            Err(e) => {
                // A failed conversion reads as a resting stick
                warn!("MCP3008 read on {} failed: {}", channel, e);
                SAMPLE_CENTER
            }
        }
    }
}

pub struct GpioButtons {
    gpio: Gpio,
    inputs: HashMap<Channel, InputPin>,
}

impl GpioButtons {
    pub fn new() -> Result<Self, HalError> {
        let gpio = Gpio::new().map_err(|e| {
            error!("Failed to open GPIO: {}", e);
            HalError::Gpio(e.to_string())
        })?;
        Ok(Self {
            gpio,
            inputs: HashMap::new(),
        })
    }
}

impl DigitalLevelProvider for GpioButtons {
    fn read_level(&mut self, channel: Channel) -> bool {
        match self.inputs.get(&channel) {
            Some(pin) => pin.is_high(),
            None => {
                warn!("GPIO {} read before being configured as input", channel);
                true
            }
        }
    }

    fn configure_input_mode(&mut self, channel: Channel) -> Result<(), HalError> {
        let pin = self
            .gpio
            .get(channel.id())
            .map_err(|e| HalError::Gpio(format!("{}: {}", channel, e)))?
            .into_input_pullup();

        debug!("GPIO {} configured as pulled-up input", channel);
        self.inputs.insert(channel, pin);
        Ok(())
    }
}
