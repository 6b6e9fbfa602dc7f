//! TWI slave-mode driver
//!
//! Decodes the hardware status into [`BusEvent`]s and applies the
//! [`BusReply`] chosen by the protocol state machine. One call to
//! [`TwiSlave::service`] per TWI interrupt.

use avr_device::atmega128a::TWI;
use crate::config::BUS_FILL_BYTE;
use crate::protocol::{BusEvent, BusReply};

const TWINT: u8 = 1 << 7;
const TWEA: u8 = 1 << 6;
const TWSTO: u8 = 1 << 4;
const TWEN: u8 = 1 << 2;
const TWIE: u8 = 1 << 0;

/// Release the bus and keep answering our address
const ACK: u8 = TWINT | TWEA | TWEN | TWIE;
/// Last byte: the next master ACK moves the hardware to "not addressed"
const LAST: u8 = TWINT | TWEN | TWIE;
/// Recover from an illegal start/stop without driving STOP on the wire
const RECOVER: u8 = TWINT | TWSTO | TWEA | TWEN | TWIE;

/// Slave-mode status codes (TWSR with the prescaler bits masked)
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TwiStatus {
    OwnWriteAddress = 0x60,
    OwnWriteAddressArbLost = 0x68,
    GeneralCall = 0x70,
    GeneralCallArbLost = 0x78,
    DataReceivedAck = 0x80,
    DataReceivedNack = 0x88,
    GeneralDataAck = 0x90,
    GeneralDataNack = 0x98,
    StopOrRepeatedStart = 0xA0,
    OwnReadAddress = 0xA8,
    OwnReadAddressArbLost = 0xB0,
    DataTransmittedAck = 0xB8,
    DataTransmittedNack = 0xC0,
    LastDataTransmittedAck = 0xC8,
}

pub struct TwiSlave {
    _private: (),
}

impl TwiSlave {
    /// Answer `address` (7-bit), general call disabled
    pub fn new(address: u8) -> Self {
        unsafe {
            let p = TWI::ptr();
            (*p).twbr.write(|w| w.bits(72));
            (*p).twsr.write(|w| w.bits(0));
            (*p).twar.write(|w| w.bits(address << 1));
            (*p).twcr.write(|w| w.bits(TWEA | TWEN | TWIE));
        }
        Self { _private: () }
    }

    pub fn status(&self) -> u8 {
        unsafe { (*TWI::ptr()).twsr.read().bits() & 0xF8 }
    }

    fn data(&self) -> u8 {
        unsafe { (*TWI::ptr()).twdr.read().bits() }
    }

    fn control(&mut self, data: Option<u8>, twcr: u8) {
        unsafe {
            let p = TWI::ptr();
            if let Some(byte) = data {
                (*p).twdr.write(|w| w.bits(byte));
            }
            (*p).twcr.write(|w| w.bits(twcr));
        }
    }

    /// Handle one TWI interrupt.
    ///
    /// A read addressing already expects the first data byte, so `handler`
    /// sees the address match followed by a byte request.
    pub fn service<F>(&mut self, mut handler: F)
    where
        F: FnMut(BusEvent) -> BusReply,
    {
        const OWN_WRITE: u8 = TwiStatus::OwnWriteAddress as u8;
        const OWN_WRITE_LOST: u8 = TwiStatus::OwnWriteAddressArbLost as u8;
        const GENERAL: u8 = TwiStatus::GeneralCall as u8;
        const GENERAL_LOST: u8 = TwiStatus::GeneralCallArbLost as u8;
        const RX_ACK: u8 = TwiStatus::DataReceivedAck as u8;
        const RX_NACK: u8 = TwiStatus::DataReceivedNack as u8;
        const GENERAL_RX_ACK: u8 = TwiStatus::GeneralDataAck as u8;
        const GENERAL_RX_NACK: u8 = TwiStatus::GeneralDataNack as u8;
        const STOP: u8 = TwiStatus::StopOrRepeatedStart as u8;
        const OWN_READ: u8 = TwiStatus::OwnReadAddress as u8;
        const OWN_READ_LOST: u8 = TwiStatus::OwnReadAddressArbLost as u8;
        const TX_ACK: u8 = TwiStatus::DataTransmittedAck as u8;
        const TX_NACK: u8 = TwiStatus::DataTransmittedNack as u8;
        const TX_LAST: u8 = TwiStatus::LastDataTransmittedAck as u8;

        let reply = match self.status() {
            OWN_WRITE | OWN_WRITE_LOST | GENERAL | GENERAL_LOST => {
                handler(BusEvent::AddressMatched { read: false })
            }
            RX_ACK | RX_NACK | GENERAL_RX_ACK | GENERAL_RX_NACK => {
                handler(BusEvent::ByteReceived(self.data()))
            }
            OWN_READ | OWN_READ_LOST => {
                handler(BusEvent::AddressMatched { read: true });
                handler(BusEvent::ByteRequested)
            }
            TX_ACK => handler(BusEvent::ByteRequested),
            TX_NACK | TX_LAST => handler(BusEvent::AckFailure),
            STOP => handler(BusEvent::Stop),
            _ => handler(BusEvent::Error),
        };
        self.apply(reply);
    }

    fn apply(&mut self, reply: BusReply) {
        match reply {
            BusReply::Ack => self.control(None, ACK),
            BusReply::Transmit(byte) => self.control(Some(byte), ACK),
            BusReply::EndOfTransmission => self.control(Some(BUS_FILL_BYTE), LAST),
            BusReply::Release => self.control(None, RECOVER),
        }
    }
}
