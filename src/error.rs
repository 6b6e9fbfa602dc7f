//! Error taxonomy
//!
//! Nothing here is fatal. Bus faults are recovered inside the slave state
//! machine and only counted; command errors mean the host gets no payload.

use ufmt::derive::uDebug;

/// Command executor failures
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// First byte of the transaction is not a known command
    UnknownCommand(u8),
    /// A stop arrived before any command byte
    EmptyCommand,
}

/// Bus conditions recovered locally by the slave state machine
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum BusFault {
    /// Host wrote more bytes than the receive buffer holds
    RxOverrun,
    /// Host read past the prepared response
    TxExhausted,
    /// Host NACKed before the response was complete
    EarlyNack,
    /// Illegal start/stop or other peripheral error
    Protocol,
}

pub type Result<T> = core::result::Result<T, Error>;
