//! Symmetric envelope around the framed message.
//!
//! Blowfish in CBC mode over whole blocks, in place. The IV is a fixed public
//! constant: the on-image format is deterministic given key and plaintext,
//! and a decoder must use the same eight bytes to read existing images.

use blowfish::Blowfish;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroizing;

/// Block size of the cipher, in bytes. The frame padding, the generator
/// counter width and the IV width all follow this constant.
pub const CIPHER_BLOCK_SIZE: usize = 8;

/// Fixed initialisation vector of the on-image format.
pub const CIPHER_IV: [u8; CIPHER_BLOCK_SIZE] = [0xe7, 0xd9, 0x5c, 0x3a, 0x52, 0x2b, 0x8a, 0x63];

type BlowfishCbcEnc = cbc::Encryptor<Blowfish>;
type BlowfishCbcDec = cbc::Decryptor<Blowfish>;

/// Encrypts the whole-block prefix of `data` in place.
///
/// Trailing bytes that do not fill a block are left untouched; callers pad
/// to a block boundary beforehand.
pub fn encrypt_in_place(data: &mut [u8], password: &[u8]) {
    let key = cipher_key(password);
    let whole = data.len() - data.len() % CIPHER_BLOCK_SIZE;
    let mut cbc = BlowfishCbcEnc::new_from_slices(&key, &CIPHER_IV)
        .expect("key length is clamped to the Blowfish range");
    for block in data[..whole].chunks_exact_mut(CIPHER_BLOCK_SIZE) {
        cbc.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

/// Decrypts the whole-block prefix of `data` in place.
pub fn decrypt_in_place(data: &mut [u8], password: &[u8]) {
    let key = cipher_key(password);
    let whole = data.len() - data.len() % CIPHER_BLOCK_SIZE;
    let mut cbc = BlowfishCbcDec::new_from_slices(&key, &CIPHER_IV)
        .expect("key length is clamped to the Blowfish range");
    for block in data[..whole].chunks_exact_mut(CIPHER_BLOCK_SIZE) {
        cbc.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

/// Turns the passphrase into key bytes accepted by the cipher.
///
/// Blowfish takes 4 to 56 key bytes. Shorter passphrases are cycled up to
/// the floor, longer ones truncated; the backing storage is scrubbed when
/// the key goes out of scope.
fn cipher_key(password: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(Vec::with_capacity(8));
    if password.is_empty() {
        key.extend_from_slice(&[0u8; 4]);
        return key;
    }
    key.extend_from_slice(&password[..password.len().min(56)]);
    let mut i = 0;
    while key.len() < 4 {
        key.push(password[i % password.len()]);
        i += 1;
    }
    key
}
