//! TWI slave protocol: command set, bus events and replies
//!
//! The host writes one command byte, then optionally reads 0, 1 or 8 bytes.
//! Byte-level handling runs in the bus interrupt ([`slave`]); interpreting
//! the command is deferred to the foreground loop ([`executor`]).

pub mod executor;
pub mod slave;

use crate::error::Error;
use ufmt::derive::uDebug;

pub use executor::{execute, CommandTarget};
pub use slave::{BusSlave, BusStats, CommandFrame};

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    ResetState = 0x00,
    ReadSensors = 0x01,
    GetSensorData = 0x02,
    DataReady = 0x03,
    ResetRainfallCounter = 0x04,
}

impl Command {
    /// Bytes the host reads back after issuing the command
    pub const fn response_len(self) -> usize {
        match self {
            Command::ResetState | Command::DataReady => 1,
            Command::GetSensorData => crate::registers::SNAPSHOT_LEN,
            Command::ReadSensors | Command::ResetRainfallCounter => 0,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Error> {
        match byte {
            0x00 => Ok(Command::ResetState),
            0x01 => Ok(Command::ReadSensors),
            0x02 => Ok(Command::GetSensorData),
            0x03 => Ok(Command::DataReady),
            0x04 => Ok(Command::ResetRainfallCounter),
            other => Err(Error::UnknownCommand(other)),
        }
    }
}

/// Conditions reported by the bus peripheral, in service order
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// Our address was seen; `read` is set when the host wants data
    AddressMatched { read: bool },
    ByteReceived(u8),
    /// Host clocks the next byte out of us
    ByteRequested,
    /// Host NACKed our last byte and ended the read
    AckFailure,
    Stop,
    /// Misplaced start/stop or other peripheral error
    Error,
}

/// How the peripheral should continue after an event
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum BusReply {
    /// Keep acknowledging
    Ack,
    /// Load this byte into the data register
    Transmit(u8),
    /// Nothing left to send; clock out filler and stop acknowledging
    EndOfTransmission,
    /// Release the bus after an error
    Release,
}
