//! Base64url transport encoding for keys and tokens.
//!
//! Output always carries `=` padding to a multiple of four characters. Input is
//! accepted padded or unpadded, but must be canonical: decoding and re-encoding
//! has to reproduce it exactly, so no two distinct strings map to one token.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;

/// Returned when a string is not canonical base64url.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("string must be a canonical base64url encoded string")]
pub struct MalformedEncoding;

/// Encodes `data` with the URL-safe alphabet and `=` padding.
pub fn encode(data: &[u8]) -> String {
    URL_SAFE.encode(data)
}

/// Decodes padded or unpadded base64url, rejecting anything that would not
/// re-encode to the same string.
pub fn decode(input: &str) -> Result<Vec<u8>, MalformedEncoding> {
    let unpadded = input.trim_end_matches('=');
    let data = URL_SAFE_NO_PAD
        .decode(unpadded)
        .map_err(|_| MalformedEncoding)?;
    if URL_SAFE_NO_PAD.encode(&data) != unpadded {
        return Err(MalformedEncoding);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, MalformedEncoding};

    #[test]
    fn test_encode_pads() {
        assert_eq!(encode(b"hello world"), "aGVsbG8gd29ybGQ=");
        assert_eq!(encode(b"a"), "YQ==");
        assert_eq!(encode(b"base64"), "YmFzZTY0");
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn test_encode_url_alphabet() {
        assert_eq!(encode(&[0xfb, 0xff]), "-_8=");
    }

    #[test]
    fn test_decode_padded_and_unpadded() {
        assert_eq!(decode("YWJjZA==").unwrap(), b"abcd".to_vec());
        assert_eq!(decode("YWJjZA").unwrap(), b"abcd".to_vec());
        assert_eq!(decode("-_8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert_eq!(decode("%%invalid*string!@#$"), Err(MalformedEncoding));
        // Standard alphabet
        assert_eq!(decode("+/8="), Err(MalformedEncoding));
        // Stray padding in the middle
        assert_eq!(decode("YQ==YQ=="), Err(MalformedEncoding));
        // Impossible length
        assert_eq!(decode("YWJjZ"), Err(MalformedEncoding));
        assert_eq!(decode(" YWJjZA"), Err(MalformedEncoding));
    }

    #[test]
    fn test_decode_rejects_non_canonical_trailing_bits() {
        // "YR" carries non-zero bits past the single encoded byte.
        assert_eq!(decode("YR=="), Err(MalformedEncoding));
        assert_eq!(decode("YQ=="), Ok(b"a".to_vec()));
    }
}
