use avr_device::atmega128a::CPU;

const SE: u8 = 1 << 5;
// SM1, SM0, SM2; all clear selects idle
const SM_MASK: u8 = 0x1C;

pub struct Power {
    _private: (),
}

impl Power {
    /// Select idle sleep: timers, TWI and the ADC keep running and their
    /// interrupts wake the core
    pub fn new() -> Self {
        unsafe {
            let p = CPU::ptr();
            (*p).mcucr.modify(|r, w| w.bits(r.bits() & !SM_MASK));
        }
        Self { _private: () }
    }

    #[inline]
    fn set_sleep_enable(&mut self, enable: bool) {
        unsafe {
            let p = CPU::ptr();
            (*p).mcucr.modify(|r, w| {
                if enable {
                    w.bits(r.bits() | SE)
                } else {
                    w.bits(r.bits() & !SE)
                }
            });
        }
    }

    /// Enable interrupts and sleep until one arrives.
    ///
    /// Call with interrupts disabled. `sei` takes effect after the next
    /// instruction, so an interrupt that became pending after the caller's
    /// last check wakes the core instead of being slept through.
    pub fn sleep_until_interrupt(&mut self) {
        self.set_sleep_enable(true);
        unsafe {
            core::arch::asm!("sei", "sleep");
        }
        self.set_sleep_enable(false);
    }
}

impl Default for Power {
    fn default() -> Self {
        Self::new()
    }
}
