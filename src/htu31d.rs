//! HTU31D digital relative humidity and temperature sensor.
//!
//! - Humidity: 0 to 100 %RH
//! - Temperature: -40 to 125 C
//! - Address(7bit): 0x40 (ADDR pin low) or 0x41 (ADDR pin high)
//!
//! A measurement is a conversion command followed by a fixed wait and a read
//! of two framed words, temperature first. The driver never polls a ready
//! flag, so the waits below must not be shortened.

use embedded_hal_1::{delay::DelayNs, i2c::I2c};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::framing::{self, Error, Framed};

pub const HTU31D_I2C_ADDR_PRIMARY: u8 = 0x40;
pub const HTU31D_I2C_ADDR_SECONDARY: u8 = 0x41;

/// Maximum reset time from the datasheet.
pub(crate) const HTU31D_RESET_TIME_US: u32 = 5_000;
/// Added on top of the datasheet conversion times.
const HTU31D_CONVERSION_MARGIN_US: u32 = 3_000;

const HTU31D_OSR_RH_POS: u8 = 3;
const HTU31D_OSR_T_POS: u8 = 1;

/// Command opcodes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Soft reset
    Reset = 0x1e,
    /// Start a conversion; oversampling bits are OR-ed in
    Conversion = 0x40,
    /// Read temperature and humidity of the last conversion
    ReadTRH = 0x00,
}

/// Oversampling rate, trading conversion time for resolution.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    /// RH 0.040 %RH in 1.0 ms, T 0.040 C in 1.6 ms
    Osr0 = 0,
    /// RH 0.025 %RH in 2.0 ms, T 0.025 C in 3.1 ms
    Osr1,
    /// RH 0.016 %RH in 3.9 ms, T 0.016 C in 6.1 ms
    Osr2,
    /// RH 0.011 %RH in 7.8 ms, T 0.012 C in 12.1 ms
    Osr3,
}

impl Default for Oversampling {
    fn default() -> Self {
        Oversampling::Osr0
    }
}

impl Oversampling {
    fn humidity_conversion_us(self) -> u32 {
        match self {
            Oversampling::Osr0 => 1_000,
            Oversampling::Osr1 => 2_000,
            Oversampling::Osr2 => 3_900,
            Oversampling::Osr3 => 7_800,
        }
    }

    fn temperature_conversion_us(self) -> u32 {
        match self {
            Oversampling::Osr0 => 1_600,
            Oversampling::Osr1 => 3_100,
            Oversampling::Osr2 => 6_100,
            Oversampling::Osr3 => 12_100,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub humidity_oversampling: Oversampling,
    pub temperature_oversampling: Oversampling,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            humidity_oversampling: Oversampling::default(),
            temperature_oversampling: Oversampling::default(),
        }
    }
}

impl Config {
    /// Conversion opcode with the oversampling bits set.
    pub fn conversion_command(&self) -> u8 {
        Command::Conversion as u8
            | (self.humidity_oversampling as u8) << HTU31D_OSR_RH_POS
            | (self.temperature_oversampling as u8) << HTU31D_OSR_T_POS
    }

    /// Time to wait between the conversion command and reading the result.
    ///
    /// 5.6 ms with the default configuration.
    pub fn conversion_time_us(&self) -> u32 {
        self.humidity_oversampling.humidity_conversion_us()
            + self.temperature_oversampling.temperature_conversion_us()
            + HTU31D_CONVERSION_MARGIN_US
    }
}

/// Calibrated measurement data
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// temperature in degrees celsius
    pub temperature: f32,
    /// percent relative humidity
    pub humidity: f32,
}

impl Measurement {
    /// Converts a raw pair. Values are not clamped to the nominal range.
    pub fn from_raw(temperature_raw: u16, humidity_raw: u16) -> Self {
        Measurement {
            temperature: temperature_raw as f32 * 165.0 / 65535.0 - 40.0,
            humidity: humidity_raw as f32 * 100.0 / 65535.0,
        }
    }
}

/// Representation of an HTU31D
///
/// Operations on one instance are strictly sequential: a command, its wait and
/// its read must not be interleaved with another command to the same device.
/// If a measurement is abandoned halfway, call [`HTU31D::reset`] before the
/// next one.
#[derive(Debug)]
pub struct HTU31D<I2C> {
    bus: Framed<I2C>,
    config: Config,
}

impl<I2C> HTU31D<I2C> {
    /// Create a new HTU31D struct using the primary I²C address `0x40`
    pub fn new_primary(i2c: I2C) -> Self {
        Self::new(i2c, HTU31D_I2C_ADDR_PRIMARY)
    }

    /// Create a new HTU31D struct using the secondary I²C address `0x41`
    pub fn new_secondary(i2c: I2C) -> Self {
        Self::new(i2c, HTU31D_I2C_ADDR_SECONDARY)
    }

    /// Create a new HTU31D struct using a custom I²C address
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self::with_config(i2c, address, Config::default())
    }

    pub fn with_config(i2c: I2C, address: u8, config: Config) -> Self {
        HTU31D {
            bus: Framed::new(i2c, address),
            config,
        }
    }

    pub fn address(&self) -> u8 {
        self.bus.address()
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn release(self) -> I2C {
        self.bus.release()
    }
}

impl<I2C> HTU31D<I2C>
where
    I2C: I2c,
{
    /// Soft reset. Must precede the first measurement unless the sensor has
    /// just powered on.
    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I2C::Error> {
        debug!("HTU31D@{:#x}: reset", self.bus.address());
        self.bus.send_command(Command::Reset as u8)?;
        framing::wait(delay, HTU31D_RESET_TIME_US);
        Ok(())
    }

    /// Starts a conversion and waits for it to complete.
    pub fn conversion<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I2C::Error> {
        self.bus.send_command(self.config.conversion_command())?;
        framing::wait(delay, self.config.conversion_time_us());
        Ok(())
    }

    /// Reads the result of the last conversion as `(temperature_raw, humidity_raw)`.
    pub fn read_raw_pair(&mut self) -> Result<(u16, u16), Error<I2C::Error>> {
        self.bus.send_command(Command::ReadTRH as u8).map_err(Error::I2c)?;
        let [temperature, humidity] = self.bus.read_words::<2>()?;
        Ok((temperature, humidity))
    }

    /// Captures and converts one temperature and humidity reading.
    pub fn measure<D: DelayNs>(&mut self, delay: &mut D) -> Result<Measurement, Error<I2C::Error>> {
        self.conversion(delay).map_err(Error::I2c)?;
        let (temperature, humidity) = self.read_raw_pair()?;
        let measurement = Measurement::from_raw(temperature, humidity);
        debug!(
            "HTU31D@{:#x}: {} C, {} %RH",
            self.bus.address(),
            measurement.temperature,
            measurement.humidity
        );
        Ok(measurement)
    }
}
