//! # dctsteg
//!
//! Hides short messages inside JPEG images by modulating the least
//! significant bits of quantised DCT coefficients, and recovers them given
//! the same passphrase.
//!
//! The payload is framed with a length prefix and a digest, encrypted with
//! a block cipher, and spread across the image along a passphrase-keyed
//! pseudo-random permutation of all usable coefficient positions. A
//! coefficient whose low bit has to change moves by one in a direction
//! drawn from OS randomness, so the modification is statistically
//! independent of the prior value.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! let stats = dctsteg::encode(
//!     Path::new("cover.jpeg"),
//!     b"meet at dawn",
//!     b"swordfish",
//!     dctsteg::DEFAULT_DCT_RADIUS,
//!     Path::new("out.jpeg"),
//! )?;
//! eprint!("{stats}");
//!
//! let (message, _) = dctsteg::decode(
//!     Path::new("out.jpeg"),
//!     b"swordfish",
//!     dctsteg::DEFAULT_DCT_RADIUS,
//! )?;
//! assert_eq!(message, b"meet at dawn");
//! # Ok::<(), dctsteg::StegError>(())
//! ```
//!
//! Decoding with the wrong passphrase fails with the same *garbage* status
//! an unremarkable image produces; the two cases are indistinguishable by
//! design.

mod cipher;
mod embed;
mod entropy;
mod enumerator;
mod error;
mod framing;
mod pipeline;
mod prng;
mod stats;
mod varint;

pub mod jpeg;

pub use error::{describe, Result, StegError};
pub use pipeline::{decode, encode, estimate};
pub use stats::{ChannelInfo, Statistics};

/// Radius the command-line front-end embeds with: coefficients (i, j) with
/// i^2 + j^2 strictly below R^2 carry payload bits, four per block at this
/// setting.
pub const DEFAULT_DCT_RADIUS: u8 = 2;
