//! Configuration constants for the weather sensor front-end

use crate::acquisition::WindowTiming;

/// CPU frequency in Hz, injected by the build script
pub const CPU_FREQ_HZ: u32 = parse_u32(env!("MCU_FREQ_HZ"));

/// Debug console baud rate
pub const UART_BAUD: u32 = 9600;

/// 7-bit TWI slave address answered by this device
pub const BUS_ADDRESS: u8 = 0x48;

/// Bytes the host may write in one transaction; the rest are dropped
pub const RX_CAPACITY: usize = 2;

/// Largest response the host can read back
pub const TX_CAPACITY: usize = 8;

/// Length of the pulse-counting window opened by every RTC tick
pub const WINDOW_DURATION_MS: u32 = 2000;

/// Timer1 setup for the acquisition window, checked at compile time
pub const WINDOW_TIMING: WindowTiming =
    match WindowTiming::for_duration(CPU_FREQ_HZ, WINDOW_DURATION_MS) {
        Some(timing) => timing,
        None => panic!("acquisition window does not fit a 16-bit timer"),
    };

/// Filler the host reads while no cycle has completed yet
pub const NOT_READY_SENTINEL: u8 = 0xAA;

/// Filler clocked out once the host reads past the prepared response
pub const BUS_FILL_BYTE: u8 = 0xFF;

/// Sensor lines, all on PORTE and sharing one edge handler
pub mod port {
    pub const RTC_TICK_BIT: u8 = 4;
    pub const RAIN_GAUGE_BIT: u8 = 5;
    pub const ANEMOMETER_BIT: u8 = 6;

    pub const RTC_TICK_MASK: u8 = 1 << RTC_TICK_BIT;
    pub const RAIN_GAUGE_MASK: u8 = 1 << RAIN_GAUGE_BIT;
    pub const ANEMOMETER_MASK: u8 = 1 << ANEMOMETER_BIT;

    /// Bits the demultiplexer looks at
    pub const SENSOR_MASK: u8 = RTC_TICK_MASK | RAIN_GAUGE_MASK | ANEMOMETER_MASK;

    /// Host-ready output, PORTC
    pub const HOST_READY_BIT: u8 = 7;
}

/// ADC multiplexer inputs (PORTF)
pub mod adc {
    pub const UV_CHANNEL: u8 = 0;
    pub const WIND_DIRECTION_CHANNEL: u8 = 1;
}

const fn parse_u32(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut value: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        assert!(digit >= b'0' && digit <= b'9', "MCU_FREQ_HZ must be decimal");
        value = value * 10 + (digit - b'0') as u32;
        i += 1;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_frequency() {
        assert_eq!(parse_u32("16000000"), 16_000_000);
        assert_eq!(parse_u32("8000000"), 8_000_000);
        assert!(CPU_FREQ_HZ > 0);
    }

    #[test]
    fn window_timing_fits_timer1() {
        let ticks = WINDOW_TIMING.ticks() as u64 * WINDOW_TIMING.prescaler.divisor() as u64;
        let ms = ticks * 1000 / CPU_FREQ_HZ as u64;
        assert!(ms.abs_diff(WINDOW_DURATION_MS as u64) <= 1);
    }

    #[test]
    fn sensor_lines_do_not_overlap() {
        assert_eq!(port::SENSOR_MASK.count_ones(), 3);
    }
}
