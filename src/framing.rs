//! Command/response framing.
//!
//! Devices in this family take a single command byte and answer with a
//! stream of 3-byte frames: a big-endian 16-bit word followed by its CRC-8.
//!
//! ```text
//! +-----+-----+-----+-----+-----+-----+
//! | MSB | LSB | CRC | MSB | LSB | CRC | ...
//! +-----+-----+-----+-----+-----+-----+
//! ```

use embedded_hal_1::{delay::DelayNs, i2c::I2c};

/// Bytes per framed word on the wire.
pub const FRAME_LEN: usize = 3;
/// Maximum number of words fetched by a single [`Framed::read_words`].
pub const MAX_WORDS: usize = 8;

// x^8 + x^5 + x^4 + 1
const CRC8_POLYNOMIAL: u8 = 0x31;
const CRC8_INIT: u8 = 0x00;

/// Framing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I²C bus error
    I2c(E),
    /// A received frame failed CRC validation; the whole read is discarded.
    ChecksumMismatch {
        /// index of the first corrupt frame
        frame: usize,
        /// CRC byte sent by the device
        received: u8,
        /// CRC computed over the frame's data bytes
        computed: u8,
    },
    /// The byte buffer does not hold exactly one frame per output word.
    LengthMismatch {
        /// bytes supplied
        bytes: usize,
        /// words requested
        words: usize,
    },
}

impl<E> From<FrameError> for Error<E> {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::ChecksumMismatch {
                frame,
                received,
                computed,
            } => Error::ChecksumMismatch {
                frame,
                received,
                computed,
            },
            FrameError::LengthMismatch { bytes, words } => Error::LengthMismatch { bytes, words },
        }
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(err) => write!(f, "I2C bus error: {:?}", err),
            Error::ChecksumMismatch {
                frame,
                received,
                computed,
            } => write!(
                f,
                "CRC error in frame {}: received {:#04x}, computed {:#04x}",
                frame, received, computed
            ),
            Error::LengthMismatch { bytes, words } => {
                write!(f, "{} bytes cannot hold {} frames", bytes, words)
            }
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}

/// Bus-independent errors of [`decode_frames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// A frame failed CRC validation.
    ChecksumMismatch {
        /// index of the first corrupt frame
        frame: usize,
        /// CRC byte sent by the device
        received: u8,
        /// CRC computed over the frame's data bytes
        computed: u8,
    },
    /// `bytes.len()` is not `words.len() * FRAME_LEN`.
    LengthMismatch {
        /// bytes supplied
        bytes: usize,
        /// words requested
        words: usize,
    },
}

/// Byte length of `N` frames, checked against [`MAX_WORDS`] at compile time.
pub(crate) struct Frames<const N: usize>;

impl<const N: usize> Frames<N> {
    pub(crate) const LEN: usize = {
        assert!(N <= MAX_WORDS, "too many words for a single read");
        N * FRAME_LEN
    };
}

/// CRC-8, polynomial 0x31, initial value 0x00, MSB first, no reflection and
/// no final XOR.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC8_INIT;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Builds the on-wire frame for `word`.
pub fn encode_frame(word: u16) -> [u8; FRAME_LEN] {
    let [msb, lsb] = word.to_be_bytes();
    [msb, lsb, crc8(&[msb, lsb])]
}

/// Validates every frame in `bytes`, then decodes them into `words`.
///
/// `bytes` must hold exactly `words.len()` frames. `words` is only written
/// once the length and all frames have passed validation.
pub fn decode_frames(bytes: &[u8], words: &mut [u16]) -> Result<(), FrameError> {
    if bytes.len() != words.len() * FRAME_LEN {
        return Err(FrameError::LengthMismatch {
            bytes: bytes.len(),
            words: words.len(),
        });
    }

    for (frame, chunk) in bytes.chunks_exact(FRAME_LEN).enumerate() {
        let computed = crc8(&chunk[..2]);
        if computed != chunk[2] {
            return Err(FrameError::ChecksumMismatch {
                frame,
                received: chunk[2],
                computed,
            });
        }
    }
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(FRAME_LEN)) {
        *word = u16::from_be_bytes([chunk[0], chunk[1]]);
    }
    Ok(())
}

/// Suspends the caller for `duration_us` microseconds. No bus traffic.
#[inline]
pub fn wait<D: DelayNs>(delay: &mut D, duration_us: u32) {
    trace!("wait {} us", duration_us);
    delay.delay_us(duration_us);
}

/// A device at a fixed address on an I²C bus, talking in framed words.
///
/// Pass `&mut bus` or an `embedded-hal-bus` device to share one bus between
/// several sensors.
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

impl<I2C> Framed<I2C>
where
    I2C: I2c,
{
    /// Writes the single byte `command`. The device acts on it with its own
    /// latency; waiting is up to the caller.
    pub fn send_command(&mut self, command: u8) -> Result<(), I2C::Error> {
        trace!("command {:#x} -> {:#x}", command, self.address);
        self.i2c.write(self.address, &[command])
    }

    /// Reads `N` framed words in one bus transfer.
    ///
    /// Fails as a whole on the first corrupt frame; no word of a failed read
    /// is returned.
    pub fn read_words<const N: usize>(&mut self) -> Result<[u16; N], Error<I2C::Error>> {
        let mut buf = [0u8; MAX_WORDS * FRAME_LEN];
        let buf = &mut buf[..Frames::<N>::LEN];
        self.i2c.read(self.address, buf).map_err(Error::I2c)?;

        let mut words = [0u16; N];
        decode_frames(buf, &mut words).map_err(|err| {
            warn!("bad response from {:#x}: {:?}", self.address, err);
            Error::from(err)
        })?;
        Ok(words)
    }
}
