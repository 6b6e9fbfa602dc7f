//! Acquisition window timer
//!
//! A one-shot hardware countdown that bounds wind-speed pulse counting.
//! Opening the window force-reloads the counter and prescaler so no time
//! from a previous cycle carries over, and never raises a spurious expiry.

use super::pulse::PulseCounter;

/// Hardware countdown used for the window
pub trait WindowTimer {
    /// Reload prescaler and counter without raising an expiry
    fn force_reload(&mut self);

    fn start(&mut self);

    /// Halt the countdown; it does not restart on its own
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Acknowledge the expiry so it does not fire again
    fn clear_expired(&mut self);
}

/// 16-bit timer prescaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Prescaler {
    Direct = 1,
    Div8 = 2,
    Div64 = 3,
    Div256 = 4,
    Div1024 = 5,
}

impl Prescaler {
    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Direct => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    /// Clock-select bits
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Prescaler and compare value for a window of a given length
///
/// In clear-on-compare mode the counter runs from 0 up to and including
/// `compare`, so one window lasts `compare + 1` prescaled ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowTiming {
    pub prescaler: Prescaler,
    pub compare: u16,
}

impl WindowTiming {
    /// Smallest prescaler whose tick count fits the 16-bit compare register
    pub const fn for_duration(cpu_hz: u32, duration_ms: u32) -> Option<Self> {
        const PRESCALERS: [Prescaler; 5] = [
            Prescaler::Direct,
            Prescaler::Div8,
            Prescaler::Div64,
            Prescaler::Div256,
            Prescaler::Div1024,
        ];
        let mut i = 0;
        while i < PRESCALERS.len() {
            let prescaler = PRESCALERS[i];
            let ticks = (cpu_hz as u64 / prescaler.divisor() as u64) * duration_ms as u64 / 1000;
            if ticks > 0 && ticks <= u16::MAX as u64 + 1 {
                return Some(Self {
                    prescaler,
                    compare: (ticks - 1) as u16,
                });
            }
            i += 1;
        }
        None
    }

    /// Prescaled ticks in one window
    pub const fn ticks(self) -> u32 {
        self.compare as u32 + 1
    }
}

/// Wind-pulse counter gated by the window timer
pub struct AcquisitionWindow<T> {
    timer: T,
    pulses: u16,
}

impl<T: WindowTimer> AcquisitionWindow<T> {
    pub fn new(mut timer: T) -> Self {
        timer.stop();
        timer.clear_expired();
        Self { timer, pulses: 0 }
    }

    pub fn is_open(&self) -> bool {
        self.timer.is_running()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

impl<T: WindowTimer> PulseCounter for AcquisitionWindow<T> {
    fn begin(&mut self) {
        self.pulses = 0;
        self.timer.stop();
        self.timer.force_reload();
        self.timer.start();
    }

    fn end(&mut self) -> u16 {
        self.timer.stop();
        self.timer.clear_expired();
        self.pulses
    }

    fn pulse(&mut self) -> bool {
        let open = self.timer.is_running();
        if open {
            self.pulses = self.pulses.saturating_add(1);
        }
        open
    }

    fn count(&self) -> u16 {
        self.pulses
    }

    fn is_counting(&self) -> bool {
        self.is_open()
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockTimer;
    use super::*;

    #[test]
    fn two_second_window_at_16mhz() {
        let timing = WindowTiming::for_duration(16_000_000, 2000).unwrap();
        assert_eq!(timing.prescaler, Prescaler::Div1024);
        assert_eq!(timing.compare, 31249);
        assert_eq!(timing.ticks(), 31250);
    }

    #[test]
    fn short_window_uses_small_prescaler() {
        let timing = WindowTiming::for_duration(16_000_000, 1).unwrap();
        assert_eq!(timing.prescaler, Prescaler::Direct);
        assert_eq!(timing.compare, 15999);
    }

    #[test]
    fn full_counter_range_is_usable() {
        // 65536 ticks at /1: compare sits at the top of the register
        let timing = WindowTiming::for_duration(65_536_000, 1).unwrap();
        assert_eq!(timing.prescaler, Prescaler::Direct);
        assert_eq!(timing.compare, u16::MAX);
    }

    #[test]
    fn unrepresentable_window_is_rejected() {
        assert_eq!(WindowTiming::for_duration(16_000_000, 10_000), None);
        assert_eq!(WindowTiming::for_duration(16_000_000, 0), None);
    }

    #[test]
    fn pulses_only_count_while_open() {
        let mut window = AcquisitionWindow::new(MockTimer::default());
        assert!(!window.pulse());

        window.begin();
        assert_eq!(window.timer().reloads, 1);
        assert!(window.pulse());
        assert!(window.pulse());
        assert_eq!(window.end(), 2);

        assert!(!window.pulse());
        assert_eq!(window.count(), 2);
        assert!(!window.is_open());
    }

    #[test]
    fn reopening_resets_the_count() {
        let mut window = AcquisitionWindow::new(MockTimer::default());
        window.begin();
        window.pulse();
        window.begin();
        assert_eq!(window.count(), 0);
        assert_eq!(window.timer().reloads, 2);
        assert!(window.is_counting());
    }
}
