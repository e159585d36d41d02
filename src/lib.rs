//! Platform-agnostic Rust driver for the TE Connectivity HTU31D digital
//! relative humidity and temperature sensor.
//!
//! The driver is split in two layers:
//!
//! - [`framing`]: command/response framing for bus-addressed devices that
//!   answer in CRC-protected 16-bit words.
//! - [`htu31d`]: HTU31D command sequencing and unit conversion, built on top
//!   of a [`framing::Framed`] bus handle.
//!
//! With the `async` feature, [`asynch`] provides the same driver on top of
//! `embedded-hal-async`.
//!
//! ```ignore
//! let mut sensor = HTU31D::new_primary(i2c);
//! sensor.reset(&mut delay)?;
//! loop {
//!     match sensor.measure(&mut delay) {
//!         Ok(m) => last = m,
//!         Err(e) => log::warn!("{}", e),
//!     }
//!     delay.delay_ms(1000);
//! }
//! ```
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod framing;
pub mod htu31d;

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(test)]
mod testing;

pub use framing::{crc8, Error};
pub use htu31d::{
    Command, Config, Measurement, Oversampling, HTU31D, HTU31D_I2C_ADDR_PRIMARY, HTU31D_I2C_ADDR_SECONDARY,
};
