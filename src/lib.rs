//! Fernet provides symmetric authenticated encryption with an API that makes
//! misusing it difficult. A token carries its own version, timestamp and IV, and
//! is only ever decrypted after its HMAC has been verified in constant time.

//! # Example
//! ```rust
//! // Store `key` somewhere safe!
//! let key = fernet_token::generate_key();
//! let fernet = fernet_token::Fernet::new(&key).unwrap();
//! let token = fernet.encrypt("my top secret message!").unwrap();
//! assert_eq!(fernet.decrypt(&token).unwrap(), "my top secret message!");
//! ```
//!
//! The free functions take the key on every call and do the same work:
//! ```rust
//! let key = fernet_token::derive_key("hello world");
//! let token = fernet_token::encode("attack at dawn", &key).unwrap();
//! assert_eq!(fernet_token::decode(&token, &key).unwrap(), "attack at dawn");
//! ```

pub mod base64url;
mod error;
mod key;
mod primitives;
mod token;

pub use error::{FernetError, TokenDefect};
pub use key::MasterKey;
pub use token::{MAX_CLOCK_SKEW, MIN_TOKEN_LEN, VERSION};

use token::Freshness;

/// Generates a new, random key. Can be safely passed to `Fernet::new()`.
/// Store this somewhere safe!
///
/// # Panics
///
/// Panics if the operating system's random source is unavailable.
pub fn generate_key() -> String {
    MasterKey::generate()
        .expect("Error in getrandom")
        .to_base64()
}

/// Checks that `key` is a canonical base64url string for exactly 32 bytes.
pub fn validate_key(key: &str) -> Result<(), FernetError> {
    MasterKey::from_base64(key).map(|_| ())
}

/// Derives a key from `input` as the base64url SHA-256 digest of its UTF-8
/// bytes. Deterministic, and exactly as guessable as `input`.
pub fn derive_key(input: &str) -> String {
    MasterKey::derive(input).to_base64()
}

/// Encrypts `plaintext` under `key` and returns a base64url token.
pub fn encode(plaintext: &str, key: &str) -> Result<String, FernetError> {
    Fernet::new(key)?.encrypt(plaintext)
}

/// Verifies and decrypts `token` under `key`. The key is validated before the
/// token is looked at.
pub fn decode(token: &str, key: &str) -> Result<String, FernetError> {
    Fernet::new(key)?.decrypt(token)
}

/// Like [`decode`], but also fails with [`FernetError::InvalidTimestamp`] if the
/// token is older than `ttl_secs` seconds.
pub fn decode_with_ttl(token: &str, key: &str, ttl_secs: u64) -> Result<String, FernetError> {
    Fernet::new(key)?.decrypt_with_ttl(token, ttl_secs)
}

/// Returns the authenticated creation time of `token`, in Unix seconds.
pub fn extract_timestamp(token: &str, key: &str) -> Result<u64, FernetError> {
    Fernet::new(key)?.extract_timestamp(token)
}

/// `Fernet` encapsulates encrypt and decrypt operations for a particular key.
#[derive(Clone, Debug)]
pub struct Fernet {
    key: MasterKey,
}

impl Fernet {
    /// Returns a new fernet instance with the provided key. The key should be
    /// 32-bytes, base64url-encoded. Generating keys with [`generate_key`] is
    /// recommended. DO NOT USE A HUMAN READABLE PASSWORD AS A KEY.
    pub fn new(key: &str) -> Result<Fernet, FernetError> {
        MasterKey::from_base64(key).map(Fernet::from_key)
    }

    pub fn from_key(key: MasterKey) -> Fernet {
        Fernet { key }
    }

    /// Encrypts text. Returns a base64url token that can be passed to
    /// `Fernet::decrypt`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, FernetError> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Encrypts arbitrary bytes. The token is read back with
    /// `Fernet::decrypt_bytes`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn encrypt_bytes(&self, data: &[u8]) -> Result<String, FernetError> {
        token::encrypt_at_time(&self.key, data, token::current_time()?)
    }

    /// Decrypts a token produced by `Fernet::encrypt`. The token's age is not
    /// checked; use `Fernet::decrypt_with_ttl` for that.
    pub fn decrypt(&self, token: &str) -> Result<String, FernetError> {
        into_text(self.decrypt_bytes(token)?)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn decrypt_bytes(&self, token: &str) -> Result<Vec<u8>, FernetError> {
        token::decrypt(&self.key, token, None)
    }

    /// Decrypts a token with a time-to-live, in seconds. Tokens older than
    /// `ttl_secs`, or stamped more than [`MAX_CLOCK_SKEW`] seconds in the future,
    /// fail with [`FernetError::InvalidTimestamp`]. The timestamp is only read
    /// after the signature has been verified.
    #[tracing::instrument(level = "debug", skip(self, token))]
    pub fn decrypt_with_ttl(&self, token: &str, ttl_secs: u64) -> Result<String, FernetError> {
        let freshness = Freshness {
            ttl: ttl_secs,
            now: token::current_time()?,
        };
        into_text(token::decrypt(&self.key, token, Some(freshness))?)
    }

    /// Verifies `token` and returns its timestamp without decrypting it.
    pub fn extract_timestamp(&self, token: &str) -> Result<u64, FernetError> {
        token::timestamp(&self.key, token)
    }

    /// Encrypts data stamped with `current_time` (Unix seconds) instead of the
    /// system clock.
    ///
    /// This function has the capacity to be used incorrectly or insecurely due
    /// to the `current_time` parameter. It exists so applications can test TTL
    /// expiry with mock time; deployments must always pass the real time.
    #[cfg(feature = "fernet_danger_timestamps")]
    pub fn encrypt_at_time(&self, data: &[u8], current_time: u64) -> Result<String, FernetError> {
        token::encrypt_at_time(&self.key, data, current_time)
    }

    /// Decrypts a token, enforcing `ttl` (if any) against `current_time`
    /// instead of the system clock. The same caveats as
    /// `Fernet::encrypt_at_time` apply.
    #[cfg(feature = "fernet_danger_timestamps")]
    pub fn decrypt_at_time(
        &self,
        token: &str,
        ttl: Option<u64>,
        current_time: u64,
    ) -> Result<Vec<u8>, FernetError> {
        let freshness = ttl.map(|ttl| Freshness {
            ttl,
            now: current_time,
        });
        token::decrypt(&self.key, token, freshness)
    }
}

fn into_text(plaintext: Vec<u8>) -> Result<String, FernetError> {
    String::from_utf8(plaintext).map_err(|_| TokenDefect::Utf8.into())
}
