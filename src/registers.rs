//! Shared register set served to the host
//!
//! Each field has exactly one writer class: the port-edge handler owns the
//! rain count, the ADC handler owns the two analog readings, and the window
//! expiry handler commits the wind count. The only cross-context reader is
//! the command executor, which runs with interrupts masked on the target so
//! it never sees half of a 16-bit value.

use crate::config::{NOT_READY_SENTINEL, TX_CAPACITY};
use ufmt::derive::uDebug;

pub const SNAPSHOT_LEN: usize = 8;

const _: () = assert!(SNAPSHOT_LEN <= TX_CAPACITY);

/// Response offsets, MSB first per field
pub mod layout {
    pub const RAIN_MSB: usize = 0;
    pub const RAIN_LSB: usize = 1;
    pub const WIND_SPEED_MSB: usize = 2;
    pub const WIND_SPEED_LSB: usize = 3;
    pub const WIND_DIRECTION_MSB: usize = 4;
    pub const WIND_DIRECTION_LSB: usize = 5;
    pub const UV_MSB: usize = 6;
    pub const UV_LSB: usize = 7;
}

/// Latest committed sensor values
#[derive(Debug, uDebug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub rain_pulses: u16,
    pub wind_pulses: u16,
    pub wind_direction: u16,
    pub uv: u16,
}

impl SensorSnapshot {
    pub fn to_bytes(&self) -> [u8; SNAPSHOT_LEN] {
        let mut out = [0u8; SNAPSHOT_LEN];
        put(&mut out, layout::RAIN_MSB, self.rain_pulses);
        put(&mut out, layout::WIND_SPEED_MSB, self.wind_pulses);
        put(&mut out, layout::WIND_DIRECTION_MSB, self.wind_direction);
        put(&mut out, layout::UV_MSB, self.uv);
        out
    }
}

fn put(out: &mut [u8; SNAPSHOT_LEN], msb: usize, value: u16) {
    out[msb..msb + 2].copy_from_slice(&value.to_be_bytes());
}

/// Canonical storage for the values the host reads
#[derive(Debug, Default)]
pub struct SharedRegisterSet {
    values: SensorSnapshot,
}

impl SharedRegisterSet {
    pub const fn new() -> Self {
        Self {
            values: SensorSnapshot {
                rain_pulses: 0,
                wind_pulses: 0,
                wind_direction: 0,
                uv: 0,
            },
        }
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        self.values
    }

    pub fn commit_rain(&mut self, pulses: u16) {
        self.values.rain_pulses = pulses;
    }

    pub fn commit_wind(&mut self, pulses: u16) {
        self.values.wind_pulses = pulses;
    }

    pub fn commit_uv(&mut self, raw: u16) {
        self.values.uv = raw;
    }

    pub fn commit_wind_direction(&mut self, raw: u16) {
        self.values.wind_direction = raw;
    }

    /// Response for the get-sensor-data command
    pub fn response(&self, data_ready: bool) -> [u8; SNAPSHOT_LEN] {
        if data_ready {
            self.values.to_bytes()
        } else {
            [NOT_READY_SENTINEL; SNAPSHOT_LEN]
        }
    }
}

/// One-shot power-on indicator
#[derive(Debug)]
pub struct ResetCode(u8);

impl ResetCode {
    /// Armed at boot
    pub const fn power_on() -> Self {
        Self(1)
    }

    /// Returns 1 on the first read after boot, 0 afterwards
    pub fn take(&mut self) -> u8 {
        core::mem::replace(&mut self.0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_msb_first() {
        let snapshot = SensorSnapshot {
            rain_pulses: 0x0102,
            wind_pulses: 0x0304,
            wind_direction: 0x0305,
            uv: 0x00FF,
        };
        assert_eq!(
            snapshot.to_bytes(),
            [0x01, 0x02, 0x03, 0x04, 0x03, 0x05, 0x00, 0xFF]
        );
    }

    #[test]
    fn not_ready_response_is_sentinel() {
        let mut registers = SharedRegisterSet::new();
        registers.commit_rain(7);
        assert_eq!(registers.response(false), [0xAA; 8]);
        assert_eq!(registers.response(true)[layout::RAIN_LSB], 7);
    }

    #[test]
    fn saturated_values_are_served_verbatim() {
        let mut registers = SharedRegisterSet::new();
        registers.commit_rain(u16::MAX);
        registers.commit_wind(u16::MAX);
        registers.commit_wind_direction(u16::MAX);
        registers.commit_uv(u16::MAX);
        assert_eq!(registers.response(true), [0xFF; SNAPSHOT_LEN]);
    }

    #[test]
    fn reset_code_reads_once() {
        let mut code = ResetCode::power_on();
        assert_eq!(code.take(), 1);
        assert_eq!(code.take(), 0);
        assert_eq!(code.take(), 0);
    }
}
