//! Byte-level TWI slave state machine
//!
//! Runs entirely in the bus interrupt. Received bytes go into a small
//! fixed buffer; on the stop condition they are handed to the foreground
//! loop through a single-slot pending command. At most one command is ever
//! pending: a new address match withdraws it, so the executor never works
//! on bytes that a newer transaction is overwriting.

use super::{BusEvent, BusReply};
use crate::config::{RX_CAPACITY, TX_CAPACITY};
use crate::error::BusFault;
use ufmt::derive::uDebug;

/// Bytes of one completed write transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: [u8; RX_CAPACITY],
    len: u8,
}

impl CommandFrame {
    pub fn new(bytes: &[u8]) -> Self {
        let len = bytes.len().min(RX_CAPACITY);
        let mut frame = Self {
            bytes: [0; RX_CAPACITY],
            len: len as u8,
        };
        frame.bytes[..len].copy_from_slice(&bytes[..len]);
        frame
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn command_byte(&self) -> Option<u8> {
        self.as_bytes().first().copied()
    }
}

/// Recovered bus conditions since boot
#[derive(Debug, uDebug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub transactions: u16,
    pub rx_overruns: u16,
    pub tx_exhausted: u16,
    pub early_nacks: u16,
    pub errors: u16,
}

impl BusStats {
    fn record(&mut self, fault: BusFault) {
        let counter = match fault {
            BusFault::RxOverrun => &mut self.rx_overruns,
            BusFault::TxExhausted => &mut self.tx_exhausted,
            BusFault::EarlyNack => &mut self.early_nacks,
            BusFault::Protocol => &mut self.errors,
        };
        *counter = counter.wrapping_add(1);
    }
}

#[derive(Debug)]
pub struct BusSlave {
    rx: [u8; RX_CAPACITY],
    rx_len: usize,
    tx: [u8; TX_CAPACITY],
    tx_cursor: usize,
    amount_to_send: usize,
    pending: Option<CommandFrame>,
    stats: BusStats,
}

impl BusSlave {
    pub const fn new() -> Self {
        Self {
            rx: [0; RX_CAPACITY],
            rx_len: 0,
            tx: [0; TX_CAPACITY],
            tx_cursor: 0,
            amount_to_send: 0,
            pending: None,
            stats: BusStats {
                transactions: 0,
                rx_overruns: 0,
                tx_exhausted: 0,
                early_nacks: 0,
                errors: 0,
            },
        }
    }

    /// Bus interrupt handler
    pub fn on_event(&mut self, event: BusEvent) -> BusReply {
        match event {
            BusEvent::AddressMatched { .. } => {
                self.rx_len = 0;
                self.tx_cursor = 0;
                self.pending = None;
                self.stats.transactions = self.stats.transactions.wrapping_add(1);
                BusReply::Ack
            }
            BusEvent::ByteReceived(byte) => {
                if self.rx_len < RX_CAPACITY {
                    self.rx[self.rx_len] = byte;
                    self.rx_len += 1;
                } else {
                    // Already read out of the data register; drop it
                    self.stats.record(BusFault::RxOverrun);
                }
                BusReply::Ack
            }
            BusEvent::ByteRequested => {
                if self.tx_cursor < self.amount_to_send {
                    let byte = self.tx[self.tx_cursor];
                    self.tx_cursor += 1;
                    BusReply::Transmit(byte)
                } else {
                    self.pending = None;
                    self.stats.record(BusFault::TxExhausted);
                    BusReply::EndOfTransmission
                }
            }
            BusEvent::AckFailure => {
                if self.tx_cursor < self.amount_to_send {
                    self.stats.record(BusFault::EarlyNack);
                }
                self.tx_cursor = 0;
                BusReply::Ack
            }
            BusEvent::Stop => {
                if self.rx_len > 0 {
                    self.pending = Some(CommandFrame::new(&self.rx[..self.rx_len]));
                }
                self.rx_len = 0;
                BusReply::Ack
            }
            BusEvent::Error => {
                self.stats.record(BusFault::Protocol);
                self.rx_len = 0;
                self.tx_cursor = 0;
                BusReply::Release
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Foreground side of the hand-off
    pub fn take_pending(&mut self) -> Option<CommandFrame> {
        self.pending.take()
    }

    /// Prepare the bytes the host reads next
    pub fn load_response(&mut self, payload: &[u8]) {
        let len = payload.len().min(TX_CAPACITY);
        self.tx[..len].copy_from_slice(&payload[..len]);
        self.amount_to_send = len;
        self.tx_cursor = 0;
    }

    pub fn amount_to_send(&self) -> usize {
        self.amount_to_send
    }

    pub fn stats(&self) -> BusStats {
        self.stats
    }
}

impl Default for BusSlave {
    fn default() -> Self {
        Self::new()
    }
}
