//! The message frame: length prefix, payload and digest.
//!
//! Layout on the wire, before encryption:
//!
//! ```text
//! varint(L) || plaintext || SHA-1(plaintext) || zero padding
//! ```
//!
//! where L counts plaintext plus digest, not the prefix itself, and the
//! padding rounds the whole frame up to a cipher-block boundary. The digest
//! is what lets a decoder tell a recovered message from noise; any mismatch
//! is reported as the single *garbage* outcome.

use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use crate::cipher::CIPHER_BLOCK_SIZE;
use crate::error::{Result, StegError};
use crate::varint;

/// Length of the authentication digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// Parsed length prefix of a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameHead {
    /// Bytes of plaintext plus digest.
    pub body_len: usize,
    /// Bytes the length prefix itself occupies.
    pub prefix_len: usize,
}

impl FrameHead {
    /// Frame length before padding: prefix plus body.
    pub fn frame_len(&self) -> Result<usize> {
        self.prefix_len
            .checked_add(self.body_len)
            .ok_or(StegError::Garbage)
    }
}

/// Rounds `len` up to a whole number of cipher blocks.
pub fn padded_len(len: usize) -> Result<usize> {
    let blocks = len / CIPHER_BLOCK_SIZE + usize::from(len % CIPHER_BLOCK_SIZE != 0);
    blocks
        .checked_mul(CIPHER_BLOCK_SIZE)
        .ok_or(StegError::DataTooLong)
}

/// Builds the padded frame around `plaintext`.
///
/// Each length computation is overflow-checked; the buffer is scrubbed when
/// dropped since it carries the message in the clear until encryption.
pub fn build_frame(plaintext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let body_len = plaintext
        .len()
        .checked_add(DIGEST_LEN)
        .ok_or(StegError::DataTooLong)?;
    let prefix = varint::produce(body_len);
    let frame_len = prefix
        .len()
        .checked_add(body_len)
        .ok_or(StegError::DataTooLong)?;
    let padded = padded_len(frame_len)?;

    let mut frame = Zeroizing::new(Vec::new());
    frame
        .try_reserve_exact(padded)
        .map_err(|_| StegError::OutOfMemory)?;
    frame.extend_from_slice(&prefix);
    frame.extend_from_slice(plaintext);
    frame.extend_from_slice(&Sha1::digest(plaintext));
    frame.resize(padded, 0);
    Ok(frame)
}

/// Parses the length prefix from an already-decrypted window.
pub fn parse_head(window: &[u8]) -> Result<FrameHead> {
    let (body_len, prefix_len) = varint::yield_from(window).map_err(|_| StegError::Garbage)?;
    Ok(FrameHead {
        body_len,
        prefix_len,
    })
}

/// Checks the digest of a fully recovered frame and returns the plaintext.
///
/// Rejects bodies with no room for plaintext, truncated frames and digest
/// mismatches, all as *garbage*: a wrong passphrase and a message-free image
/// must be indistinguishable.
pub fn authenticate<'a>(frame: &'a [u8], head: &FrameHead) -> Result<&'a [u8]> {
    if head.body_len <= DIGEST_LEN {
        return Err(StegError::Garbage);
    }
    let frame_len = head.frame_len()?;
    if frame.len() < frame_len {
        return Err(StegError::Garbage);
    }
    let plaintext = &frame[head.prefix_len..frame_len - DIGEST_LEN];
    let stored = &frame[frame_len - DIGEST_LEN..frame_len];
    let digest = Sha1::digest(plaintext);
    if digest.as_slice() != stored {
        return Err(StegError::Garbage);
    }
    Ok(plaintext)
}
