//! Sensor acquisition: port edges, chained ADC and the counting window

pub mod adc_chain;
pub mod demux;
pub mod pulse;
pub mod window;

pub use adc_chain::{AdcChain, AdcDevice, Reading, SensorChannel};
pub use demux::{EventDemux, PortEventSink, PortEvents, PortSnapshot};
pub use pulse::{GatedPulseCounter, PulseCounter};
pub use window::{AcquisitionWindow, Prescaler, WindowTimer, WindowTiming};

/// Transient state owned by the interrupt handlers.
///
/// Reset at boot and re-armed at the start of every cycle, except the rain
/// count which accumulates until the host clears it.
#[derive(Debug, Default)]
pub struct AcquisitionState {
    pub data_ready: bool,
    pub rain_pulses: u16,
    pub last_reading: Option<Reading>,
}

impl AcquisitionState {
    pub const fn new() -> Self {
        Self {
            data_ready: false,
            rain_pulses: 0,
            last_reading: None,
        }
    }

    /// Cycle start: the window's data is no longer valid
    pub fn rearm(&mut self) {
        self.data_ready = false;
    }

    pub fn count_rain(&mut self) -> u16 {
        self.rain_pulses = self.rain_pulses.saturating_add(1);
        self.rain_pulses
    }
}
