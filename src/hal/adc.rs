use avr_device::atmega128a::ADC;
use crate::acquisition::AdcDevice;
use crate::config::adc::UV_CHANNEL;

const ADEN: u8 = 1 << 7;
const ADSC: u8 = 1 << 6;
const ADIF: u8 = 1 << 4;
const ADIE: u8 = 1 << 3;
// ADPS2:0 = 111, 125 kHz converter clock at 16 MHz
const PRESCALER_DIV128: u8 = 0x07;
// REFS1:0 = 01, AVCC with external cap at AREF; ADLAR clear
const REFERENCE_AVCC: u8 = 0x40;

/// Interrupt-driven converter, powered down between conversions
pub struct Adc {
    _private: (),
}

impl Adc {
    /// The converter stays off until the first cycle. Writing ADIF drops
    /// any completion left over from before reset.
    pub fn new() -> Self {
        unsafe {
            let p = ADC::ptr();
            (*p).admux.write(|w| w.bits(REFERENCE_AVCC | UV_CHANNEL));
            (*p).adcsra.write(|w| w.bits(ADIF | ADIE | PRESCALER_DIV128));
        }
        Self { _private: () }
    }

    // ADIF is cleared by writing one; keep it out of read-modify-write
    fn control(&mut self, set: u8, clear: u8) {
        unsafe {
            let p = ADC::ptr();
            (*p).adcsra.modify(|r, w| w.bits((r.bits() & !(ADIF | clear)) | set));
        }
    }
}

impl AdcDevice for Adc {
    fn select(&mut self, channel: u8) {
        unsafe {
            let p = ADC::ptr();
            (*p).admux.modify(|r, w| w.bits((r.bits() & 0xE0) | (channel & 0x1F)));
        }
    }

    fn switch_on(&mut self) {
        let enabled = unsafe { (*ADC::ptr()).adcsra.read().bits() & ADEN != 0 };
        if enabled {
            self.control(ADSC, 0);
        } else {
            self.control(ADEN, 0);
        }
    }

    fn switch_off(&mut self) {
        self.control(0, ADEN | ADSC);
    }

    fn discard_pending(&mut self) {
        self.control(ADIF, 0);
    }

    fn result(&mut self) -> u16 {
        // 16-bit access reads ADCL before ADCH
        unsafe { (*ADC::ptr()).adc.read().bits() }
    }
}

impl Default for Adc {
    fn default() -> Self {
        Self::new()
    }
}
