//! Bit-granular randomness from the operating system.
//!
//! The embedding primitive consumes one random bit per coefficient it has to
//! move. Drawing a whole OS-random byte per bit would waste entropy, so a
//! one-byte buffer is kept and served bit by bit.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Result, StegError};

/// Anything that can hand out single random bits.
///
/// The pipelines use [`OsEntropy`]; tests substitute deterministic sources.
pub trait BitSource {
    fn produce_bit(&mut self) -> Result<bool>;
}

/// OS-backed bit source with a one-byte buffer and a cursor.
pub struct OsEntropy {
    buf: u8,
    next_bit: u8,
}

impl OsEntropy {
    /// Opens the source, drawing the first byte immediately so that an
    /// unusable OS generator is reported here rather than mid-embed.
    pub fn open() -> Result<Self> {
        let mut byte = [0u8; 1];
        OsRng
            .try_fill_bytes(&mut byte)
            .map_err(|_| StegError::EntropySource)?;
        Ok(OsEntropy {
            buf: byte[0],
            next_bit: 0,
        })
    }
}

impl BitSource for OsEntropy {
    fn produce_bit(&mut self) -> Result<bool> {
        if self.next_bit == 8 {
            let mut byte = [0u8; 1];
            OsRng
                .try_fill_bytes(&mut byte)
                .map_err(|_| StegError::EntropySource)?;
            self.buf = byte[0];
            self.next_bit = 0;
        }
        let bit = self.buf & (1 << self.next_bit) != 0;
        self.next_bit += 1;
        Ok(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_eight_bits_per_byte() {
        let mut source = OsEntropy::open().unwrap();
        for _ in 0..64 {
            source.produce_bit().unwrap();
        }
    }

    #[test]
    fn bits_are_cursor_ordered() {
        // Not statistical: just pin the buffer and check the unpacking order.
        let mut source = OsEntropy {
            buf: 0b1010_0110,
            next_bit: 0,
        };
        let bits: Vec<bool> = (0..8).map(|_| source.produce_bit().unwrap()).collect();
        assert_eq!(
            bits,
            vec![false, true, true, false, false, true, false, true]
        );
    }
}
