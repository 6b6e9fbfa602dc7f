//! Foreground trace lines for the debug console
//!
//! Interrupt handlers only accumulate [`Activity`]; the foreground loop
//! formats it here, so no handler ever waits on the UART.

use crate::error::Error;
use crate::protocol::{BusStats, Command};
use crate::station::Activity;
use ufmt::{uWrite, uwriteln};

pub fn banner<W: uWrite + ?Sized>(w: &mut W, address: u8) -> Result<(), W::Error> {
    uwriteln!(w, "weather sensor front-end v{}", env!("CARGO_PKG_VERSION"))?;
    uwriteln!(w, "twi slave 0x{}", Hex(address))
}

pub fn activity<W: uWrite + ?Sized>(w: &mut W, activity: &Activity) -> Result<(), W::Error> {
    if activity.cycles_started > 0 {
        uwriteln!(w, "[ACQ] cycle start x{}", activity.cycles_started)?;
    }
    if activity.rain_tips > 0 {
        uwriteln!(w, "[ACQ] rain +{}", activity.rain_tips)?;
    }
    if activity.wind_pulses > 0 || activity.wind_discarded > 0 {
        uwriteln!(
            w,
            "[ACQ] wind +{} dropped {}",
            activity.wind_pulses,
            activity.wind_discarded
        )?;
    }
    if activity.readings > 0 {
        uwriteln!(w, "[ADC] {} reading(s)", activity.readings)?;
    }
    if activity.windows_closed > 0 {
        uwriteln!(w, "[ACQ] window closed, data ready")?;
    }
    Ok(())
}

pub fn command<W: uWrite + ?Sized>(
    w: &mut W,
    outcome: &Result<Command, Error>,
) -> Result<(), W::Error> {
    match outcome {
        Ok(command) => uwriteln!(w, "[TWI] {:?}", command),
        Err(err) => uwriteln!(w, "[TWI] rejected {:?}", err),
    }
}

/// Print only when a fault counter moved
pub fn bus_stats<W: uWrite + ?Sized>(
    w: &mut W,
    previous: &BusStats,
    current: &BusStats,
) -> Result<(), W::Error> {
    let faults = |s: &BusStats| (s.rx_overruns, s.tx_exhausted, s.early_nacks, s.errors);
    if faults(previous) != faults(current) {
        uwriteln!(w, "[TWI] {:?}", current)?;
    }
    Ok(())
}

/// Two-digit upper-case hex
pub struct Hex(pub u8);

impl ufmt::uDisplay for Hex {
    fn fmt<W: uWrite + ?Sized>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error> {
        const DIGITS: [u8; 16] = *b"0123456789ABCDEF";
        let pair = [DIGITS[(self.0 >> 4) as usize], DIGITS[(self.0 & 0x0F) as usize]];
        f.write_str(core::str::from_utf8(&pair).unwrap_or("??"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use ufmt::uwrite;

    #[derive(Default)]
    struct Capture(String);

    impl uWrite for Capture {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
            self.0.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn banner_shows_address_in_hex() {
        let mut out = Capture::default();
        banner(&mut out, 0x48).unwrap();
        assert!(out.0.contains("twi slave 0x48"));
    }

    #[test]
    fn quiet_activity_prints_nothing() {
        let mut out = Capture::default();
        activity(&mut out, &Activity::default()).unwrap();
        assert!(out.0.is_empty());
    }

    #[test]
    fn activity_lines() {
        let mut out = Capture::default();
        let act = Activity {
            cycles_started: 1,
            rain_tips: 2,
            wind_pulses: 3,
            wind_discarded: 1,
            readings: 0,
            windows_closed: 0,
        };
        activity(&mut out, &act).unwrap();
        assert_eq!(
            out.0,
            "[ACQ] cycle start x1\n[ACQ] rain +2\n[ACQ] wind +3 dropped 1\n"
        );
    }

    #[test]
    fn command_outcomes() {
        let mut out = Capture::default();
        command(&mut out, &Ok(Command::DataReady)).unwrap();
        command(&mut out, &Err(Error::UnknownCommand(9))).unwrap();
        assert_eq!(
            out.0,
            "[TWI] DataReady\n[TWI] rejected UnknownCommand(9)\n"
        );
    }

    #[test]
    fn bus_stats_only_on_new_faults() {
        let mut out = Capture::default();
        let before = BusStats::default();
        let mut after = before;
        after.transactions = 4;
        bus_stats(&mut out, &before, &after).unwrap();
        assert!(out.0.is_empty());

        after.errors = 1;
        bus_stats(&mut out, &before, &after).unwrap();
        assert!(out.0.starts_with("[TWI] BusStats"));
    }

    #[test]
    fn hex_pads_to_two_digits() {
        let mut out = Capture::default();
        uwrite!(out, "{} {}", Hex(0x0A), Hex(0xF0)).unwrap();
        assert_eq!(out.0, "0A F0");
    }
}
