//! Passphrase-keyed pseudo-random generator.
//!
//! The stream is the Blowfish-ECB encryption of a little-endian counter:
//! E_K(0) || E_K(1) || ... The key is derived by interleaving the passphrase
//! bytes with the cycle 1, 2, ..., 255, appending a trailing zero, and
//! hashing the result with SHA-1. Keying the shuffle this way means the
//! permutation of coefficient positions is reproducible from the passphrase
//! alone, while the passphrase itself never leaves the derivation.

use blowfish::cipher::generic_array::GenericArray;
use blowfish::cipher::{BlockEncrypt, KeyInit};
use blowfish::Blowfish;
use sha1::{Digest, Sha1};
use zeroize::{Zeroize, Zeroizing};

use crate::cipher::CIPHER_BLOCK_SIZE;
use crate::error::{Result, StegError};

/// Deterministic byte stream, uniform sampler and shuffler, all keyed by
/// one passphrase.
pub struct KeyedPrng {
    key: Blowfish,
    counter: u64,
    /// Unused tail of the most recent block; the live bytes sit at the end.
    queue: [u8; CIPHER_BLOCK_SIZE],
    queued: usize,
}

impl KeyedPrng {
    /// Seeds the generator from a passphrase.
    pub fn new(passphrase: &[u8]) -> Self {
        let mut seed = Zeroizing::new(vec![0u8; passphrase.len() * 2 + 1]);
        let mut filler = 1u8;
        for (k, &byte) in passphrase.iter().enumerate() {
            seed[k * 2] = byte;
            seed[k * 2 + 1] = filler;
            filler = if filler == 255 { 1 } else { filler + 1 };
        }
        let mut digest: [u8; 20] = Sha1::digest(&*seed).into();
        let key = Blowfish::new_from_slice(&digest).expect("SHA-1 output is a valid Blowfish key");
        digest.zeroize();
        KeyedPrng {
            key,
            counter: 0,
            queue: [0; CIPHER_BLOCK_SIZE],
            queued: 0,
        }
    }

    /// Encrypts the current counter into `out` and advances it.
    fn next_block(&mut self, out: &mut [u8]) {
        out.copy_from_slice(&self.counter.to_le_bytes());
        self.key.encrypt_block(GenericArray::from_mut_slice(out));
        self.counter += 1;
    }

    /// Fills `out` with the next bytes of the stream.
    ///
    /// Leftover bytes from the previous call are consumed first, whole
    /// blocks are produced straight into `out`, and a trailing partial
    /// block refills the queue.
    pub fn produce_bytes(&mut self, out: &mut [u8]) {
        if out.is_empty() {
            return;
        }
        let take = self.queued.min(out.len());
        if take > 0 {
            let start = CIPHER_BLOCK_SIZE - self.queued;
            out[..take].copy_from_slice(&self.queue[start..start + take]);
            self.queued -= take;
        }
        let mut written = take;
        while out.len() - written >= CIPHER_BLOCK_SIZE {
            let (_, rest) = out.split_at_mut(written);
            self.next_block(&mut rest[..CIPHER_BLOCK_SIZE]);
            written += CIPHER_BLOCK_SIZE;
        }
        if written < out.len() {
            let mut fresh = [0u8; CIPHER_BLOCK_SIZE];
            self.next_block(&mut fresh);
            let rest = out.len() - written;
            out[written..].copy_from_slice(&fresh[..rest]);
            self.queue = fresh;
            self.queued = CIPHER_BLOCK_SIZE - rest;
        }
    }

    /// Uniform draw from the inclusive range [a, b].
    ///
    /// Draws whole bytes, masks down to the bit width of `b - a` and
    /// rejection-loops; reducing modulo the range would bias the low values.
    pub fn uniform(&mut self, a: u64, b: u64) -> u64 {
        debug_assert!(a <= b);
        if a == b {
            return a;
        }
        let diff = b - a;
        let need_bits = 64 - diff.leading_zeros();
        let need_bytes = need_bits.div_ceil(8) as usize;
        let mask = if need_bits == 64 {
            u64::MAX
        } else {
            (1u64 << need_bits) - 1
        };
        let mut bytes = [0u8; 8];
        loop {
            self.produce_bytes(&mut bytes[..need_bytes]);
            let mut value = 0u64;
            for (k, &byte) in bytes[..need_bytes].iter().enumerate() {
                value |= (byte as u64) << (8 * k);
            }
            value &= mask;
            if value <= diff {
                return a + value;
            }
        }
    }

    /// Fisher-Yates shuffle of 1..=n.
    ///
    /// The result holds each value in that range exactly once; n = 0 yields
    /// an empty permutation.
    pub fn shuffle(&mut self, n: u32) -> Result<Vec<u32>> {
        let mut values = Vec::new();
        values
            .try_reserve_exact(n as usize)
            .map_err(|_| StegError::OutOfMemory)?;
        values.extend(1..=n);
        for upper in (1..n as usize).rev() {
            let choice = self.uniform(0, upper as u64) as usize;
            values.swap(choice, upper);
        }
        Ok(values)
    }
}

impl Drop for KeyedPrng {
    fn drop(&mut self) {
        self.counter.zeroize();
        self.queue.zeroize();
        self.queued = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_passphrase_same_stream() {
        let mut a = KeyedPrng::new(b"qwerty");
        let mut b = KeyedPrng::new(b"qwerty");
        let mut out_a = [0u8; 100];
        let mut out_b = [0u8; 100];
        a.produce_bytes(&mut out_a);
        b.produce_bytes(&mut out_b);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn different_passphrases_differ() {
        let mut a = KeyedPrng::new(b"qwerty");
        let mut b = KeyedPrng::new(b"qwertz");
        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.produce_bytes(&mut out_a);
        b.produce_bytes(&mut out_b);
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn queue_keeps_the_stream_contiguous() {
        let mut chunked = KeyedPrng::new(b"swordfish");
        let mut whole = KeyedPrng::new(b"swordfish");
        let mut a = [0u8; 29];
        chunked.produce_bytes(&mut a[..3]);
        chunked.produce_bytes(&mut a[3..10]);
        chunked.produce_bytes(&mut a[10..11]);
        chunked.produce_bytes(&mut a[11..]);
        let mut b = [0u8; 29];
        whole.produce_bytes(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut prng = KeyedPrng::new(b"range");
        for _ in 0..2000 {
            let v = prng.uniform(10, 17);
            assert!((10..=17).contains(&v));
        }
        assert_eq!(prng.uniform(42, 42), 42);
    }

    #[test]
    fn uniform_reaches_every_value() {
        let mut prng = KeyedPrng::new(b"coverage");
        let mut seen = [false; 6];
        for _ in 0..1000 {
            seen[prng.uniform(0, 5) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn uniform_is_roughly_flat() {
        // Coarse sanity bound, not a significance test: 4096 draws over 8
        // bins should put every bin within half of the expected count.
        let mut prng = KeyedPrng::new(b"flatness");
        let mut bins = [0u32; 8];
        for _ in 0..4096 {
            bins[prng.uniform(0, 7) as usize] += 1;
        }
        for &count in &bins {
            assert!((256..=768).contains(&count), "bins = {bins:?}");
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut prng = KeyedPrng::new(b"shuffle");
        let permutation = prng.shuffle(500).unwrap();
        let mut seen = vec![false; 501];
        for &v in &permutation {
            assert!((1..=500).contains(&v));
            assert!(!seen[v as usize], "duplicate {v}");
            seen[v as usize] = true;
        }
    }

    #[test]
    fn shuffle_is_deterministic_per_passphrase() {
        let first = KeyedPrng::new(b"swordfish").shuffle(64).unwrap();
        let second = KeyedPrng::new(b"swordfish").shuffle(64).unwrap();
        assert_eq!(first, second);

        let other_key = KeyedPrng::new(b"Swordfish").shuffle(64).unwrap();
        assert_ne!(first, other_key);
    }

    #[test]
    fn shuffle_of_zero_is_empty() {
        let mut prng = KeyedPrng::new(b"empty");
        assert!(prng.shuffle(0).unwrap().is_empty());
    }
}
