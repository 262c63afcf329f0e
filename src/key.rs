use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{base64url, primitives, FernetError};

/// A validated 32-byte Fernet key.
///
/// The first half signs tokens and the second half encrypts them. The halves
/// are sliced out again on every operation rather than stored.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; 32]);

/// Signing and encryption halves of a [`MasterKey`], alive for one operation.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct KeyHalves {
    pub(crate) signing: [u8; 16],
    pub(crate) encryption: [u8; 16],
}

impl MasterKey {
    /// Parses a base64url key. Fails with [`FernetError::InvalidKey`] unless the
    /// string is canonical base64url for exactly 32 bytes; the two causes are
    /// indistinguishable to the caller.
    pub fn from_base64(key: &str) -> Result<MasterKey, FernetError> {
        let mut decoded = base64url::decode(key).map_err(|_| FernetError::InvalidKey)?;
        if decoded.len() != 32 {
            decoded.zeroize();
            return Err(FernetError::InvalidKey);
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(MasterKey(bytes))
    }

    /// Generates a new random key from the operating system's CSPRNG.
    pub fn generate() -> Result<MasterKey, FernetError> {
        primitives::random_bytes().map(MasterKey)
    }

    /// Derives a key from arbitrary text as its SHA-256 digest. The same input
    /// always yields the same key, so this is only as strong as the input.
    pub fn derive(input: &str) -> MasterKey {
        MasterKey(primitives::sha256(input.as_bytes()))
    }

    /// Returns the padded base64url form accepted by [`MasterKey::from_base64`].
    pub fn to_base64(&self) -> String {
        base64url::encode(&self.0)
    }

    pub(crate) fn split(&self) -> KeyHalves {
        let mut signing = [0u8; 16];
        signing.copy_from_slice(&self.0[..16]);
        let mut encryption = [0u8; 16];
        encryption.copy_from_slice(&self.0[16..]);
        KeyHalves {
            signing,
            encryption,
        }
    }
}

impl PartialEq for MasterKey {
    fn eq(&self, other: &MasterKey) -> bool {
        primitives::constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for MasterKey {}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}
