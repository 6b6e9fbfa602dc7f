//! Weather sensor front-end firmware for the ATmega128
//!
//! Aggregates a tipping-bucket rain gauge, an anemometer reed switch, a
//! wind-direction potentiometer and a UV photo-sensor, and serves the latest
//! readings to a host as a TWI slave. Acquisition is paced by an external
//! RTC pulse.
//!
//! Everything outside `hal` is hardware-independent and runs in host unit
//! tests.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

pub mod acquisition;
pub mod config;
pub mod drivers;
pub mod error;
pub mod protocol;
pub mod registers;
pub mod station;
pub mod trace;

#[cfg(all(target_arch = "avr", feature = "atmega128"))]
pub mod hal;

pub use error::{BusFault, Error};
pub use station::WeatherStation;
