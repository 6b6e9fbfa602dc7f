//! Two-step chained analog acquisition: UV first, then wind direction.
//!
//! Only one conversion is ever in flight. The chain is started by the cycle
//! start sequence and advanced from the conversion-complete interrupt.

use crate::config::adc::{UV_CHANNEL, WIND_DIRECTION_CHANNEL};
use ufmt::derive::uDebug;

/// Converter operations the chain needs
pub trait AdcDevice {
    /// Route the multiplexer to a channel
    fn select(&mut self, channel: u8);

    /// Set the converter's on bit. From power-down the first write wakes
    /// the converter and a second write starts the conversion.
    fn switch_on(&mut self);

    /// Power the converter down, aborting any conversion
    fn switch_off(&mut self);

    /// Drop a conversion-complete event that has not been serviced yet.
    /// Powering down does not clear it.
    fn discard_pending(&mut self);

    /// Right-aligned 10-bit result. The low byte is read first; reading the
    /// high byte releases the result registers for the next conversion.
    fn result(&mut self) -> u16;
}

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChannel {
    Uv,
    WindDirection,
}

impl SensorChannel {
    pub const fn mux(self) -> u8 {
        match self {
            SensorChannel::Uv => UV_CHANNEL,
            SensorChannel::WindDirection => WIND_DIRECTION_CHANNEL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Idle,
    Converting(SensorChannel),
}

/// One completed conversion
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub channel: SensorChannel,
    pub raw: u16,
}

#[derive(Debug)]
pub struct AdcChain {
    state: ChainState,
}

impl AdcChain {
    pub const fn new() -> Self {
        Self {
            state: ChainState::Idle,
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Begin the chain at the UV channel, abandoning any conversion in flight
    /// together with a completion still waiting to be serviced
    pub fn start<A: AdcDevice>(&mut self, adc: &mut A) {
        adc.switch_off();
        adc.discard_pending();
        self.arm(adc, SensorChannel::Uv);
    }

    /// Conversion-complete handler
    ///
    /// Returns the finished reading, or `None` for a completion that no
    /// chain step was waiting for.
    pub fn on_conversion_complete<A: AdcDevice>(&mut self, adc: &mut A) -> Option<Reading> {
        adc.switch_off();
        let raw = adc.result();

        match self.state {
            ChainState::Idle => None,
            ChainState::Converting(SensorChannel::Uv) => {
                self.arm(adc, SensorChannel::WindDirection);
                Some(Reading {
                    channel: SensorChannel::Uv,
                    raw,
                })
            }
            ChainState::Converting(SensorChannel::WindDirection) => {
                self.state = ChainState::Idle;
                Some(Reading {
                    channel: SensorChannel::WindDirection,
                    raw,
                })
            }
        }
    }

    fn arm<A: AdcDevice>(&mut self, adc: &mut A, channel: SensorChannel) {
        adc.select(channel.mux());
        adc.switch_on();
        adc.switch_on();
        self.state = ChainState::Converting(channel);
    }
}

impl Default for AdcChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::AdcDevice;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Op {
        Select(u8),
        On,
        Off,
        Discard,
        Read,
    }

    /// Records register traffic and serves a preset result per channel.
    /// `completion_pending` stands in for the interrupt flag, which
    /// survives power-down.
    #[derive(Debug, Default)]
    pub struct MockAdc {
        pub ops: Vec<Op>,
        pub selected: u8,
        pub results: [u16; 8],
        pub completion_pending: bool,
    }

    impl MockAdc {
        pub fn with_results(uv: u16, wind_direction: u16) -> Self {
            let mut adc = Self::default();
            adc.results[crate::config::adc::UV_CHANNEL as usize] = uv;
            adc.results[crate::config::adc::WIND_DIRECTION_CHANNEL as usize] = wind_direction;
            adc
        }

    }

    impl AdcDevice for MockAdc {
        fn select(&mut self, channel: u8) {
            self.selected = channel;
            self.ops.push(Op::Select(channel));
        }

        fn switch_on(&mut self) {
            self.ops.push(Op::On);
        }

        fn switch_off(&mut self) {
            self.ops.push(Op::Off);
        }

        fn discard_pending(&mut self) {
            self.completion_pending = false;
            self.ops.push(Op::Discard);
        }

        fn result(&mut self) -> u16 {
            self.ops.push(Op::Read);
            self.results[self.selected as usize]
        }
    }
}
