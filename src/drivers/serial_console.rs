//! Line-oriented debug console over any blocking-capable serial port

use embedded_hal::serial;
use ufmt::uWrite;

pub struct SerialConsole<S> {
    serial: S,
}

impl<S: serial::Write<u8>> SerialConsole<S> {
    pub fn new(serial: S) -> Self {
        Self { serial }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), S::Error> {
        nb::block!(self.serial.write(byte))
    }

    /// Wait for the last byte to leave the shifter
    pub fn flush(&mut self) -> Result<(), S::Error> {
        nb::block!(self.serial.flush())
    }

    pub fn release(self) -> S {
        self.serial
    }
}

/// `\n` goes out as CR LF for terminal emulators
impl<S: serial::Write<u8>> uWrite for SerialConsole<S> {
    type Error = S::Error;

    fn write_str(&mut self, s: &str) -> Result<(), S::Error> {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r')?;
            }
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::serial::{Mock, Transaction};
    use ufmt::uwriteln;

    #[test]
    fn newline_becomes_crlf() {
        let expectations = [
            Transaction::write_many(b"ok 3"),
            Transaction::write(b'\r'),
            Transaction::write(b'\n'),
            Transaction::flush(),
        ];
        let mut console = SerialConsole::new(Mock::new(&expectations));
        uwriteln!(console, "ok {}", 3u8).unwrap();
        console.flush().unwrap();
        console.release().done();
    }

    #[test]
    fn trace_lines_reach_the_port() {
        let expectations = [
            Transaction::write_many(b"[ACQ] rain +1"),
            Transaction::write_many(b"\r\n"),
        ];
        let mut console = SerialConsole::new(Mock::new(&expectations));
        let activity = crate::station::Activity {
            rain_tips: 1,
            ..Default::default()
        };
        crate::trace::activity(&mut console, &activity).unwrap();
        console.release().done();
    }
}
