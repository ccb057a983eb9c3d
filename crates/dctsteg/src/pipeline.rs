//! The encode / decode / estimate entry points.
//!
//! All three share one session setup: open the image, decode its
//! coefficients, register every component's usable block grid with the
//! enumerator and total up the capacity. Encode and decode additionally
//! derive the keyed permutation that maps message-bit indices onto
//! coefficient positions. Resources clean themselves up on every path out:
//! buffers that held key material or plaintext are scrubbing wrappers, the
//! generator zeroes its state on drop and files close with their handles.

use std::path::Path;

use zeroize::Zeroizing;

use crate::cipher::{self, CIPHER_BLOCK_SIZE};
use crate::embed;
use crate::entropy::OsEntropy;
use crate::enumerator::{usable_in_block, Enumerator};
use crate::error::{Result, StegError};
use crate::framing;
use crate::jpeg::JpegImage;
use crate::prng::KeyedPrng;
use crate::stats::{ChannelInfo, Statistics};
use crate::varint;

/// An opened image with its coefficient enumeration.
struct Session {
    image: JpegImage,
    map: Enumerator,
    channels: Vec<ChannelInfo>,
    bits_available: u32,
    bits_in_block: u8,
}

fn open_session(file: &Path, radius: u8) -> Result<Session> {
    let image = JpegImage::open(file)?;
    let mut map = Enumerator::new(radius);
    let mut channels = Vec::with_capacity(image.components().len());

    for (index, component) in image.components().iter().enumerate() {
        let geometry = image.geometry(index);
        let afraid_width = geometry.downsampled_width % 8 != 0;
        let afraid_height = geometry.downsampled_height % 8 != 0;
        // Border blocks containing a partial tile have coefficient
        // statistics unlike interior blocks, so they stay out of the pool.
        let wbl = geometry.width_in_blocks - u32::from(afraid_width);
        let hbl = geometry.height_in_blocks - u32::from(afraid_height);
        map.add(wbl, hbl)?;
        channels.push(ChannelInfo {
            afraid_width,
            afraid_height,
            h_sampling: component.h_sampling,
            v_sampling: component.v_sampling,
            width: geometry.downsampled_width,
            height: geometry.downsampled_height,
            width_in_blocks: wbl,
            height_in_blocks: hbl,
            usable_blocks: wbl * hbl,
        });
    }

    let bits_available = map.count()?;
    Ok(Session {
        image,
        map,
        channels,
        bits_available,
        bits_in_block: usable_in_block(radius),
    })
}

impl Session {
    fn statistics(self, bits_used: u32) -> Statistics {
        Statistics {
            bits_available: self.bits_available,
            bits_in_block: self.bits_in_block,
            colorspace: self.image.colorspace().name(),
            channels: self.channels,
            bits_used,
        }
    }
}

/// Harvests `nblocks` cipher blocks worth of bits along the permutation and
/// decrypts them.
fn harvest(
    session: &Session,
    permutation: &[u32],
    nblocks: usize,
    password: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let need_bits = nblocks
        .checked_mul(CIPHER_BLOCK_SIZE * 8)
        .ok_or(StegError::Garbage)?;
    if need_bits > session.bits_available as usize {
        return Err(StegError::Garbage);
    }

    let mut message = Zeroizing::new(Vec::new());
    message
        .try_reserve_exact(need_bits / 8)
        .map_err(|_| StegError::OutOfMemory)?;
    message.resize(need_bits / 8, 0);

    for bit in 0..need_bits {
        let pos = session.map.locate(permutation[bit] - 1)?;
        let block = session.image.block(pos.component as usize, pos.m, pos.n);
        if embed::extract_bit(block[pos.i as usize * 8 + pos.j as usize]) {
            message[bit / 8] |= 1 << (bit % 8);
        }
    }

    cipher::decrypt_in_place(&mut message, password);
    Ok(message)
}

/// Hides `data` from `input` into a new image at `output`.
///
/// The message is framed, encrypted and spread bit by bit over the keyed
/// permutation of usable coefficients; the output file copies every other
/// parameter of the source.
pub fn encode(
    input: &Path,
    data: &[u8],
    password: &[u8],
    radius: u8,
    output: &Path,
) -> Result<Statistics> {
    let mut session = open_session(input, radius)?;

    let mut prng = KeyedPrng::new(password);
    let permutation = prng.shuffle(session.bits_available)?;
    let mut entropy = OsEntropy::open()?;

    let mut frame = framing::build_frame(data)?;
    cipher::encrypt_in_place(&mut frame, password);

    let bits = frame.len().checked_mul(8).ok_or(StegError::DataTooLong)?;
    if bits > session.bits_available as usize {
        return Err(StegError::DataTooLong);
    }
    log::debug!(
        "embedding {} bits into {} available positions",
        bits,
        session.bits_available
    );

    for bit in 0..bits {
        let pos = session.map.locate(permutation[bit] - 1)?;
        let block = session
            .image
            .block_mut(pos.component as usize, pos.m, pos.n);
        let value = frame[bit / 8] & (1 << (bit % 8)) != 0;
        embed::embed_bit(
            &mut block[pos.i as usize * 8 + pos.j as usize],
            value,
            &mut entropy,
        )?;
    }

    session.image.write_to(output)?;
    Ok(session.statistics(bits as u32))
}

/// Recovers a hidden message from `input`.
///
/// Every failure shape after the image opens (unparseable prefix, lengths
/// that do not fit, digest mismatch) comes back as *garbage*, so a wrong
/// passphrase cannot be told apart from an image with nothing inside.
pub fn decode(input: &Path, password: &[u8], radius: u8) -> Result<(Vec<u8>, Statistics)> {
    let session = open_session(input, radius)?;

    let mut prng = KeyedPrng::new(password);
    let permutation = prng.shuffle(session.bits_available)?;

    // First pass: just enough blocks to cover any possible length prefix.
    let head_blocks = framing::padded_len(varint::estimate())? / CIPHER_BLOCK_SIZE;
    let head_window = harvest(&session, &permutation, head_blocks, password)?;
    let head = framing::parse_head(&head_window)?;

    if head.body_len <= framing::DIGEST_LEN {
        return Err(StegError::Garbage);
    }
    let frame_len = head.frame_len()?;
    let padded = framing::padded_len(frame_len).map_err(|_| StegError::Garbage)?;
    let total_bits = padded.checked_mul(8).ok_or(StegError::Garbage)?;
    if total_bits > session.bits_available as usize {
        return Err(StegError::Garbage);
    }
    log::debug!("prefix claims a {}-byte body, reading {} bits", head.body_len, total_bits);

    let frame = harvest(&session, &permutation, padded / CIPHER_BLOCK_SIZE, password)?;
    let plaintext = framing::authenticate(&frame, &head)?;

    let mut message = Vec::new();
    message
        .try_reserve_exact(plaintext.len())
        .map_err(|_| StegError::OutOfMemory)?;
    message.extend_from_slice(plaintext);

    Ok((message, session.statistics(total_bits as u32)))
}

/// Reports the capacity of `input` without touching it.
pub fn estimate(input: &Path, radius: u8) -> Result<Statistics> {
    let session = open_session(input, radius)?;
    Ok(session.statistics(0))
}
