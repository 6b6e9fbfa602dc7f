//! Event demultiplexer for the shared sensor port
//!
//! The RTC tick, rain gauge and anemometer share one port. Every edge on any
//! of them enters the same handler, which XORs the new pin state against the
//! previous snapshot and services each changed line from that one snapshot.
//! The port is never re-read mid-handler, so simultaneous changes are all
//! handled in a single entry.

use crate::config::port::{ANEMOMETER_MASK, RAIN_GAUGE_MASK, RTC_TICK_MASK, SENSOR_MASK};
use ufmt::derive::uDebug;

/// One read of the sensor port pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSnapshot(pub u8);

impl PortSnapshot {
    pub const fn bits(self) -> u8 {
        self.0
    }

    fn is_high(self, mask: u8) -> bool {
        self.0 & mask != 0
    }
}

/// Receives the classified events in service order
pub trait PortEventSink {
    /// RTC line went low: start a new acquisition cycle
    fn rtc_tick(&mut self);

    /// Rain gauge line went high: one bucket tip
    fn rain_tip(&mut self);

    /// Anemometer line went high. Returns `false` if the pulse arrived
    /// outside the acquisition window and was discarded.
    fn wind_pulse(&mut self) -> bool;
}

/// What a single handler entry did
#[derive(Debug, uDebug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortEvents {
    pub cycle_started: bool,
    pub rain_tips: u8,
    pub wind_pulses: u8,
    pub wind_discarded: u8,
}

impl PortEvents {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug)]
pub struct EventDemux {
    last: PortSnapshot,
}

impl EventDemux {
    /// `initial` is the pin state sampled at boot, before edge interrupts
    /// are enabled
    pub const fn new(initial: PortSnapshot) -> Self {
        Self { last: initial }
    }

    pub fn last_snapshot(&self) -> PortSnapshot {
        self.last
    }

    /// Classify the changes since the previous snapshot and dispatch them.
    ///
    /// The RTC tick is serviced first so a wind pulse in the same snapshot
    /// is judged against the freshly opened window.
    pub fn on_port_change<S: PortEventSink>(
        &mut self,
        current: PortSnapshot,
        sink: &mut S,
    ) -> PortEvents {
        let changed = (current.bits() ^ self.last.bits()) & SENSOR_MASK;
        self.last = current;

        let mut events = PortEvents::default();

        if changed & RTC_TICK_MASK != 0 && !current.is_high(RTC_TICK_MASK) {
            sink.rtc_tick();
            events.cycle_started = true;
        }

        // Both switches chatter on release; count rising edges only
        if changed & RAIN_GAUGE_MASK != 0 && current.is_high(RAIN_GAUGE_MASK) {
            sink.rain_tip();
            events.rain_tips += 1;
        }

        if changed & ANEMOMETER_MASK != 0 && current.is_high(ANEMOMETER_MASK) {
            if sink.wind_pulse() {
                events.wind_pulses += 1;
            } else {
                events.wind_discarded += 1;
            }
        }

        events
    }
}
