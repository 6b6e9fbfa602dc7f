//! Pulse-counting capability
//!
//! Two ways to bound a pulse count: the acquisition window, where a hardware
//! timer decides when counting stops (see [`AcquisitionWindow`]), and the
//! gated counter below, where the caller attaches and detaches the input
//! around its own delay.
//!
//! [`AcquisitionWindow`]: super::window::AcquisitionWindow

pub trait PulseCounter {
    /// Clear the count and start accepting pulses
    fn begin(&mut self);

    /// Stop accepting pulses and return the total
    fn end(&mut self) -> u16;

    /// Record one edge. Returns `false` when the pulse was discarded.
    fn pulse(&mut self) -> bool;

    fn count(&self) -> u16;

    fn is_counting(&self) -> bool;
}

/// Counter enabled between explicit attach/detach calls
#[derive(Debug, Default)]
pub struct GatedPulseCounter {
    count: u16,
    attached: bool,
}

impl GatedPulseCounter {
    pub const fn new() -> Self {
        Self {
            count: 0,
            attached: false,
        }
    }

    pub fn attach(&mut self) {
        self.begin();
    }

    pub fn detach(&mut self) -> u16 {
        self.end()
    }
}

impl PulseCounter for GatedPulseCounter {
    fn begin(&mut self) {
        self.count = 0;
        self.attached = true;
    }

    fn end(&mut self) -> u16 {
        self.attached = false;
        self.count
    }

    fn pulse(&mut self) -> bool {
        if self.attached {
            self.count = self.count.saturating_add(1);
        }
        self.attached
    }

    fn count(&self) -> u16 {
        self.count
    }

    fn is_counting(&self) -> bool {
        self.attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gated_counter_ignores_detached_pulses() {
        let mut counter = GatedPulseCounter::new();
        assert!(!counter.pulse());

        counter.attach();
        assert!(counter.pulse());
        assert!(counter.pulse());
        assert_eq!(counter.detach(), 2);

        assert!(!counter.pulse());
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn attach_restarts_the_count() {
        let mut counter = GatedPulseCounter::new();
        counter.attach();
        counter.pulse();
        counter.attach();
        assert_eq!(counter.count(), 0);
        assert!(counter.is_counting());
    }
}
