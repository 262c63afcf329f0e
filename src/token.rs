//! Token layout, construction, and the ordered validation pipeline.
//!
//! ```text
//! version (1) | timestamp (8, BE) | iv (16) | ciphertext (16n) | hmac (32)
//! ```
//!
//! Decoding checks, in order: transport encoding, length, version, signature,
//! then (optionally) the timestamp window, and only then decrypts.

use byteorder::{BigEndian, ByteOrder};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::key::{KeyHalves, MasterKey};
use crate::{base64url, primitives, FernetError, TokenDefect};

/// The only token version this crate produces or accepts.
pub const VERSION: u8 = 0x80;

/// How far in the future a token's timestamp may be, in seconds, when a TTL is
/// enforced.
pub const MAX_CLOCK_SKEW: u64 = 60;

const TIMESTAMP_OFFSET: usize = 1;
const IV_OFFSET: usize = 9;
const CIPHERTEXT_OFFSET: usize = 25;
const BLOCK_LEN: usize = 16;
const HMAC_LEN: usize = 32;

/// Smallest well-formed token: header, one ciphertext block and the HMAC.
pub const MIN_TOKEN_LEN: usize = CIPHERTEXT_OFFSET + BLOCK_LEN + HMAC_LEN;

/// A TTL requirement, checked against the authenticated timestamp.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Freshness {
    pub(crate) ttl: u64,
    pub(crate) now: u64,
}

pub(crate) fn current_time() -> Result<u64, FernetError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|_| FernetError::Clock)
}

/// Encrypts `data` with a fresh random IV and returns the base64url token.
pub(crate) fn encrypt_at_time(
    key: &MasterKey,
    data: &[u8],
    current_time: u64,
) -> Result<String, FernetError> {
    let iv = primitives::random_bytes()?;
    encrypt_from_parts(key, data, current_time, &iv)
}

fn encrypt_from_parts(
    key: &MasterKey,
    data: &[u8],
    current_time: u64,
    iv: &[u8; 16],
) -> Result<String, FernetError> {
    let keys = key.split();
    let ciphertext = primitives::aes128_cbc_encrypt(&keys.encryption, iv, data)?;

    let mut token = Vec::with_capacity(CIPHERTEXT_OFFSET + ciphertext.len() + HMAC_LEN);
    token.push(VERSION);
    let mut timestamp = [0u8; 8];
    BigEndian::write_u64(&mut timestamp, current_time);
    token.extend_from_slice(&timestamp);
    token.extend_from_slice(iv);
    token.extend_from_slice(&ciphertext);

    let hmac = primitives::hmac_sha256(&keys.signing, &token)?;
    token.extend_from_slice(&hmac);

    Ok(base64url::encode(&token))
}

/// Runs the full pipeline and returns the plaintext bytes.
pub(crate) fn decrypt(
    key: &MasterKey,
    token: &str,
    freshness: Option<Freshness>,
) -> Result<Vec<u8>, FernetError> {
    let keys = key.split();
    let verified = verify(&keys, token)?;

    if let Some(freshness) = freshness {
        check_freshness(verified.timestamp(), freshness)?;
    }

    verified.decrypt(&keys)
}

/// Authenticates `token` and returns its timestamp without decrypting.
pub(crate) fn timestamp(key: &MasterKey, token: &str) -> Result<u64, FernetError> {
    let keys = key.split();
    verify(&keys, token).map(|verified| verified.timestamp())
}

/// Token bytes whose length, version and HMAC have been checked. Nothing may
/// read the timestamp or decrypt before this exists.
struct VerifiedToken {
    data: Vec<u8>,
}

impl VerifiedToken {
    fn timestamp(&self) -> u64 {
        BigEndian::read_u64(&self.data[TIMESTAMP_OFFSET..IV_OFFSET])
    }

    fn decrypt(self, keys: &KeyHalves) -> Result<Vec<u8>, FernetError> {
        let mut iv = [0u8; 16];
        iv.copy_from_slice(&self.data[IV_OFFSET..CIPHERTEXT_OFFSET]);
        let ciphertext = &self.data[CIPHERTEXT_OFFSET..self.data.len() - HMAC_LEN];

        primitives::aes128_cbc_decrypt(&keys.encryption, &iv, ciphertext).map_err(|_| {
            tracing::debug!(stage = "decrypt", "Authenticated token failed to decrypt");
            FernetError::InvalidToken(TokenDefect::Payload)
        })
    }
}

fn verify(keys: &KeyHalves, token: &str) -> Result<VerifiedToken, FernetError> {
    let data = base64url::decode(token).map_err(|_| {
        tracing::debug!(stage = "encoding", "Rejecting token");
        TokenDefect::Encoding
    })?;

    if !has_valid_length(data.len()) {
        tracing::debug!(stage = "length", len = data.len(), "Rejecting token");
        return Err(TokenDefect::Length.into());
    }

    if !primitives::constant_time_eq(&data[..TIMESTAMP_OFFSET], &[VERSION]) {
        tracing::debug!(stage = "version", "Rejecting token");
        return Err(FernetError::InvalidVersion);
    }

    let (signed, hmac) = data.split_at(data.len() - HMAC_LEN);
    let expected_hmac = primitives::hmac_sha256(&keys.signing, signed)?;
    if !primitives::constant_time_eq(&expected_hmac, hmac) {
        tracing::debug!(stage = "signature", "Rejecting token");
        return Err(FernetError::InvalidSignature);
    }

    Ok(VerifiedToken { data })
}

fn has_valid_length(len: usize) -> bool {
    len >= MIN_TOKEN_LEN && (len - CIPHERTEXT_OFFSET - HMAC_LEN) % BLOCK_LEN == 0
}

fn check_freshness(timestamp: u64, freshness: Freshness) -> Result<(), FernetError> {
    if timestamp.saturating_add(freshness.ttl) < freshness.now {
        tracing::debug!(stage = "ttl", timestamp, "Token expired");
        return Err(FernetError::InvalidTimestamp);
    }
    if freshness.now.saturating_add(MAX_CLOCK_SKEW) < timestamp {
        tracing::debug!(stage = "ttl", timestamp, "Token stamped in the future");
        return Err(FernetError::InvalidTimestamp);
    }
    Ok(())
}
