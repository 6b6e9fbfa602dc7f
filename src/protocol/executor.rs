//! Foreground command executor
//!
//! Interprets the pending command outside interrupt context and prepares
//! the response the host reads next.

use super::{BusSlave, Command, CommandFrame};
use crate::error::{Error, Result};
use crate::registers::SNAPSHOT_LEN;

/// State the commands act on
pub trait CommandTarget {
    /// One-shot power-on indicator
    fn take_reset_code(&mut self) -> u8;

    fn data_ready(&self) -> bool;

    /// Get-sensor-data payload, or the not-ready sentinel
    fn sensor_response(&self) -> [u8; SNAPSHOT_LEN];

    /// Same sequence as an RTC tick
    fn start_cycle(&mut self);

    fn reset_rainfall(&mut self);
}

/// Run one command and load its response into the slave.
///
/// Unknown or empty frames leave nothing to read.
pub fn execute<T: CommandTarget>(
    frame: &CommandFrame,
    target: &mut T,
    slave: &mut BusSlave,
) -> Result<Command> {
    let command = match frame.command_byte() {
        Some(byte) => Command::try_from(byte),
        None => Err(Error::EmptyCommand),
    };

    let command = match command {
        Ok(command) => command,
        Err(err) => {
            slave.load_response(&[]);
            return Err(err);
        }
    };

    match command {
        Command::ResetState => {
            let code = target.take_reset_code();
            slave.load_response(&[code]);
        }
        Command::ReadSensors => {
            target.start_cycle();
            slave.load_response(&[]);
        }
        Command::GetSensorData => {
            slave.load_response(&target.sensor_response());
        }
        Command::DataReady => {
            slave.load_response(&[target.data_ready() as u8]);
        }
        Command::ResetRainfallCounter => {
            target.reset_rainfall();
            slave.load_response(&[]);
        }
    }

    Ok(command)
}
