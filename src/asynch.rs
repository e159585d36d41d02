//! Async HTU31D driver on top of `embedded-hal-async`.
//!
//! Same command sequence and timing as [`crate::htu31d`], with the waits
//! awaited instead of blocking. Dropping a `measure` future halfway leaves the
//! sensor in an unknown state; call [`HTU31D::reset`] before reusing it.

use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::framing::{decode_frames, Error, Frames, FRAME_LEN, MAX_WORDS};
use crate::htu31d::{
    Command, Config, Measurement, HTU31D_I2C_ADDR_PRIMARY, HTU31D_I2C_ADDR_SECONDARY, HTU31D_RESET_TIME_US,
};

/// Suspends the calling task for `duration_us` microseconds.
#[inline]
pub async fn wait<D: DelayNs>(delay: &mut D, duration_us: u32) {
    trace!("wait {} us", duration_us);
    delay.delay_us(duration_us).await;
}

/// Async counterpart of [`crate::framing::Framed`].
#[derive(Debug)]
pub struct Framed<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> Framed<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Framed { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Framed<I2C> {
    /// Writes the single byte `command`; waiting is up to the caller.
    pub async fn send_command(&mut self, command: u8) -> Result<(), I2C::Error> {
        trace!("command {:#x} -> {:#x}", command, self.address);
        self.i2c.write(self.address, &[command]).await
    }

    /// Reads `N` framed words in one bus transfer, all or nothing.
    pub async fn read_words<const N: usize>(&mut self) -> Result<[u16; N], Error<I2C::Error>> {
        let mut buf = [0u8; MAX_WORDS * FRAME_LEN];
        let buf = &mut buf[..Frames::<N>::LEN];
        self.i2c.read(self.address, buf).await.map_err(Error::I2c)?;

        let mut words = [0u16; N];
        decode_frames(buf, &mut words).map_err(|err| {
            warn!("bad response from {:#x}: {:?}", self.address, err);
            Error::from(err)
        })?;
        Ok(words)
    }
}

/// Async representation of an HTU31D
#[derive(Debug)]
pub struct HTU31D<I2C> {
    bus: Framed<I2C>,
    config: Config,
}

impl<I2C> HTU31D<I2C> {
    pub fn new_primary(i2c: I2C) -> Self {
        Self::new(i2c, HTU31D_I2C_ADDR_PRIMARY)
    }

    pub fn new_secondary(i2c: I2C) -> Self {
        Self::new(i2c, HTU31D_I2C_ADDR_SECONDARY)
    }

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

impl<I2C: I2c> HTU31D<I2C> {
    /// Soft reset. Must precede the first measurement unless the sensor has
    /// just powered on.
    pub async fn reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I2C::Error> {
        debug!("HTU31D@{:#x}: reset", self.bus.address());
        self.bus.send_command(Command::Reset as u8).await?;
        wait(delay, HTU31D_RESET_TIME_US).await;
        Ok(())
    }

    /// Starts a conversion and waits for it to complete.
    pub async fn conversion<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I2C::Error> {
        self.bus.send_command(self.config.conversion_command()).await?;
        wait(delay, self.config.conversion_time_us()).await;
        Ok(())
    }

    /// Reads the result of the last conversion as `(temperature_raw, humidity_raw)`.
    pub async fn read_raw_pair(&mut self) -> Result<(u16, u16), Error<I2C::Error>> {
        self.bus
            .send_command(Command::ReadTRH as u8)
            .await
            .map_err(Error::I2c)?;
        let [temperature, humidity] = self.bus.read_words::<2>().await?;
        Ok((temperature, humidity))
    }

    /// Captures and converts one temperature and humidity reading.
    pub async fn measure<D: DelayNs>(&mut self, delay: &mut D) -> Result<Measurement, Error<I2C::Error>> {
        self.conversion(delay).await.map_err(Error::I2c)?;
        let (temperature, humidity) = self.read_raw_pair().await?;
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
