use avr_device::atmega128a::{CPU, TC1};
use crate::acquisition::{Prescaler, WindowTimer, WindowTiming};

const CS_MASK: u8 = 0x07;
const WGM12: u8 = 1 << 3;
const PSR321: u8 = 1 << 0;
const OCF1A: u8 = 1 << 4;
const OCIE1A: u8 = 1 << 4;

/// Timer1 in clear-on-compare mode as the acquisition window countdown.
///
/// The compare-match interrupt stops the clock, so every window is one-shot.
pub struct WindowTimer1 {
    prescaler: Prescaler,
}

impl WindowTimer1 {
    pub fn new(timing: WindowTiming) -> Self {
        unsafe {
            let p = TC1::ptr();
            (*p).tccr1a.write(|w| w.bits(0));
            (*p).tccr1b.write(|w| w.bits(WGM12));
            (*p).ocr1a.write(|w| w.bits(timing.compare));
            (*p).tcnt1.write(|w| w.bits(0));
            // Flag bits clear on a written one; never read-modify-write TIFR
            (*p).tifr.write(|w| w.bits(OCF1A));
            (*p).timsk.modify(|r, w| w.bits(r.bits() | OCIE1A));
        }
        Self {
            prescaler: timing.prescaler,
        }
    }
}

impl WindowTimer for WindowTimer1 {
    fn force_reload(&mut self) {
        self.stop();
        unsafe {
            // Shared with timers 2 and 3, which this firmware leaves unused
            (*CPU::ptr()).sfior.modify(|r, w| w.bits(r.bits() | PSR321));
            let p = TC1::ptr();
            (*p).tcnt1.write(|w| w.bits(0));
            (*p).tifr.write(|w| w.bits(OCF1A));
        }
    }

    fn start(&mut self) {
        let bits = self.prescaler.bits();
        unsafe {
            let p = TC1::ptr();
            (*p).tccr1b.modify(|r, w| w.bits((r.bits() & !CS_MASK) | bits));
        }
    }

    fn stop(&mut self) {
        unsafe {
            let p = TC1::ptr();
            (*p).tccr1b.modify(|r, w| w.bits(r.bits() & !CS_MASK));
        }
    }

    fn is_running(&self) -> bool {
        unsafe { (*TC1::ptr()).tccr1b.read().bits() & CS_MASK != 0 }
    }

    fn clear_expired(&mut self) {
        unsafe {
            (*TC1::ptr()).tifr.write(|w| w.bits(OCF1A));
        }
    }
}
