use std::fmt;

/// Errors returned by the encode and decode pipelines.
///
/// Variants are ordered the way the decoder checks for them: a malformed key is
/// reported before the token is looked at, and a bad signature is always
/// reported before any decryption is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FernetError {
    /// The key is not canonical base64url or does not decode to 32 bytes. Which
    /// of the two it was is deliberately not reported.
    #[error("key must be a 32-byte base64url encoded string")]
    InvalidKey,

    #[error("invalid token: {0}")]
    InvalidToken(TokenDefect),

    #[error("token version must be 0x80")]
    InvalidVersion,

    #[error("invalid signature, signature did not match digest")]
    InvalidSignature,

    /// The token is older than the requested TTL, or stamped too far in the
    /// future.
    #[error("token timestamp is outside the accepted window")]
    InvalidTimestamp,

    #[error("entropy source failure: {0}")]
    Random(getrandom::Error),

    #[error("system clock is set before the unix epoch")]
    Clock,

    #[error("cryptographic primitive failure: {0}")]
    Crypto(String),
}

/// What was wrong with a token that failed structural or payload checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDefect {
    /// Not canonical base64url.
    Encoding,
    /// Shorter than the minimum token, or the ciphertext is not block aligned.
    Length,
    /// Decryption failed after the signature had already been verified.
    Payload,
    /// The authenticated plaintext is not valid UTF-8.
    Utf8,
}

impl fmt::Display for TokenDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            TokenDefect::Encoding => "token must be a base64url encoded string",
            TokenDefect::Length => "token has invalid length",
            TokenDefect::Payload => "ciphertext could not be decrypted",
            TokenDefect::Utf8 => "plaintext is not valid utf-8",
        };
        f.write_str(msg)
    }
}

impl From<TokenDefect> for FernetError {
    fn from(defect: TokenDefect) -> FernetError {
        FernetError::InvalidToken(defect)
    }
}

#[cfg(test)]
mod tests {
    use super::{FernetError, TokenDefect};

    #[test]
    fn test_display() {
        assert_eq!(
            FernetError::InvalidToken(TokenDefect::Length).to_string(),
            "invalid token: token has invalid length"
        );
        assert_eq!(
            FernetError::InvalidVersion.to_string(),
            "token version must be 0x80"
        );
        assert_eq!(
            FernetError::from(TokenDefect::Encoding),
            FernetError::InvalidToken(TokenDefect::Encoding)
        );
    }
}
