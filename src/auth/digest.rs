//! Keyed one-way credential digest.
//!
//! Three passes, each feeding the next as text:
//! 1. SHA-256 of the UTF-8 input, lowercase hex (64 chars)
//! 2. Blowfish-ECB over the hex text, zero padded to the 8-byte block size,
//!    lowercase hex of the ciphertext
//! 3. Rotate-13 over that hex text (letters within their case, digits mod 10)
//!
//! The output must stay bit-for-bit stable: reference files produced by
//! earlier deployments are compared against it directly.

use std::fmt;

use blowfish::cipher::generic_array::GenericArray;
use blowfish::cipher::{BlockEncrypt, KeyInit};
use blowfish::Blowfish;
use sha2::{Digest, Sha256};

use crate::error::{DeckError, Result};

/// Blowfish block size in bytes.
const BLOCK_SIZE: usize = 8;

/// Shift applied by the final substitution pass.
const ROTATION: u8 = 13;

/// Key accepted by Blowfish: 4 to 56 bytes.
pub const MIN_KEY_LEN: usize = 4;
pub const MAX_KEY_LEN: usize = 56;

/// Deterministic multi-pass transform of a credential string.
///
/// Built once from the shared fixed key; every call with the same input
/// yields the same output.
///
/// # Example
/// ```
/// use opsdeck::auth::CredentialDigest;
///
/// let digest = CredentialDigest::new(b"MyFixedBlowfishKey123456").unwrap();
/// let a = digest.transform("operator");
/// assert_eq!(a, digest.transform("operator"));
/// assert_eq!(a.len(), 128);
/// ```
pub struct CredentialDigest {
    cipher: Blowfish,
}

impl CredentialDigest {
    /// Build the engine from the fixed key.
    ///
    /// Fails when the key is empty or outside Blowfish's accepted length.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(DeckError::Config("fixed key is not set".to_string()));
        }
        let cipher: Blowfish = Blowfish::new_from_slice(key).map_err(|_| {
            DeckError::Config(format!(
                "fixed key must be {}-{} bytes, got {}",
                MIN_KEY_LEN,
                MAX_KEY_LEN,
                key.len()
            ))
        })?;
        Ok(Self { cipher })
    }

    /// Run all three passes over `input`.
    pub fn transform(&self, input: &str) -> String {
        let hashed = sha256_hex(input);
        let encrypted = self.encrypt_hex(hashed.as_bytes());
        rotate13(&encrypted)
    }

    /// Zero-pad to the block size and encrypt block by block (ECB).
    fn encrypt_hex(&self, plaintext: &[u8]) -> String {
        let mut buf = zero_pad(plaintext);
        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            self.cipher.encrypt_block(GenericArray::from_mut_slice(block));
        }
        hex::encode(buf)
    }
}

impl fmt::Debug for CredentialDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialDigest")
            .field("cipher", &"Blowfish-ECB")
            .finish()
    }
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Right-pad with NUL bytes to the next multiple of the block size.
/// Already-aligned input is returned unchanged.
fn zero_pad(data: &[u8]) -> Vec<u8> {
    let mut buf = data.to_vec();
    let rem = buf.len() % BLOCK_SIZE;
    if rem != 0 {
        buf.resize(buf.len() + (BLOCK_SIZE - rem), 0);
    }
    buf
}

/// Rotate ASCII letters by 13 within their case and digits by 13 modulo 10.
pub fn rotate13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => rotate_within(c, b'a', 26),
            'A'..='Z' => rotate_within(c, b'A', 26),
            '0'..='9' => rotate_within(c, b'0', 10),
            other => other,
        })
        .collect()
}

fn rotate_within(c: char, base: u8, modulus: u8) -> char {
    let offset = (c as u8 - base + ROTATION) % modulus;
    (base + offset) as char
}
