use avr_device::atmega128a::USART0;
use crate::config::{CPU_FREQ_HZ, UART_BAUD};
use core::convert::Infallible;
use embedded_hal::serial;

const UDRE0: u8 = 1 << 5;
const TXC0: u8 = 1 << 6;
const TXEN0: u8 = 1 << 3;
// Asynchronous, 8 data bits, no parity, 1 stop bit
const FORMAT_8N1: u8 = 0x06;

const UBRR: u16 = (CPU_FREQ_HZ / (16 * UART_BAUD) - 1) as u16;

/// USART0, transmit only, polled
pub struct Uart {
    in_flight: bool,
}

impl Uart {
    pub fn new() -> Self {
        let [lo, hi] = UBRR.to_le_bytes();
        unsafe {
            let p = USART0::ptr();
            (*p).ubrr0h.write(|w| w.bits(hi));
            (*p).ubrr0l.write(|w| w.bits(lo));
            (*p).ucsr0c.write(|w| w.bits(FORMAT_8N1));
            (*p).ucsr0b.write(|w| w.bits(TXEN0));
        }
        Self { in_flight: false }
    }
}

impl serial::Write<u8> for Uart {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        unsafe {
            let p = USART0::ptr();
            if (*p).ucsr0a.read().bits() & UDRE0 == 0 {
                return Err(nb::Error::WouldBlock);
            }
            // TXC0 is cleared by writing one; re-arm it for flush()
            (*p).ucsr0a.modify(|r, w| w.bits((r.bits() & !UDRE0) | TXC0));
            (*p).udr0.write(|w| w.bits(byte));
        }
        self.in_flight = true;
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        let complete = unsafe { (*USART0::ptr()).ucsr0a.read().bits() & TXC0 != 0 };
        if self.in_flight && !complete {
            return Err(nb::Error::WouldBlock);
        }
        self.in_flight = false;
        Ok(())
    }
}

impl Default for Uart {
    fn default() -> Self {
        Self::new()
    }
}
