//! Cryptographic primitives used by the token pipeline.
//!
//! Two backends provide the same functions: the RustCrypto crates (the default
//! `rustcrypto` feature) and OpenSSL (`openssl` feature, preferred when both are
//! enabled). Randomness always comes from `getrandom`.

use crate::FernetError;

#[cfg(not(any(feature = "openssl", feature = "rustcrypto")))]
compile_error!("enable either the `openssl` or the `rustcrypto` feature");

pub(crate) use backend::{aes128_cbc_decrypt, aes128_cbc_encrypt, constant_time_eq, hmac_sha256, sha256};

/// Fills a fresh array from the operating system's CSPRNG.
pub(crate) fn random_bytes<const N: usize>() -> Result<[u8; N], FernetError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(FernetError::Random)?;
    Ok(buf)
}

#[cfg(feature = "openssl")]
mod backend {
    use crate::FernetError;
    use openssl::hash::MessageDigest;
    use openssl::pkey::PKey;
    use openssl::sign::Signer;
    use openssl::symm::{self, Cipher};
    use std::convert::TryInto;

    fn crypto_err(err: openssl::error::ErrorStack) -> FernetError {
        FernetError::Crypto(err.to_string())
    }

    pub(crate) fn aes128_cbc_encrypt(
        key: &[u8; 16],
        iv: &[u8; 16],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, FernetError> {
        symm::encrypt(Cipher::aes_128_cbc(), key, Some(&iv[..]), plaintext).map_err(crypto_err)
    }

    pub(crate) fn aes128_cbc_decrypt(
        key: &[u8; 16],
        iv: &[u8; 16],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, FernetError> {
        symm::decrypt(Cipher::aes_128_cbc(), key, Some(&iv[..]), ciphertext).map_err(crypto_err)
    }

    pub(crate) fn hmac_sha256(key: &[u8; 16], data: &[u8]) -> Result<[u8; 32], FernetError> {
        let pkey = PKey::hmac(key).map_err(crypto_err)?;
        let mut signer = Signer::new(MessageDigest::sha256(), &pkey).map_err(crypto_err)?;
        signer.update(data).map_err(crypto_err)?;
        let digest = signer.sign_to_vec().map_err(crypto_err)?;
        digest
            .as_slice()
            .try_into()
            .map_err(|_| FernetError::Crypto("unexpected HMAC-SHA256 length".to_string()))
    }

    pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
        openssl::sha::sha256(data)
    }

    pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
        // memcmp::eq panics on mismatched lengths; lengths are public here.
        a.len() == b.len() && openssl::memcmp::eq(a, b)
    }
}

#[cfg(all(feature = "rustcrypto", not(feature = "openssl")))]
mod backend {
    use crate::FernetError;
    use aes::cipher::block_padding::Pkcs7;
    use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
    use hmac::{Hmac, Mac};
    use sha2::{Digest, Sha256};
    use subtle::ConstantTimeEq;

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
    type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

    pub(crate) fn aes128_cbc_encrypt(
        key: &[u8; 16],
        iv: &[u8; 16],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, FernetError> {
        Ok(Aes128CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    pub(crate) fn aes128_cbc_decrypt(
        key: &[u8; 16],
        iv: &[u8; 16],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, FernetError> {
        Aes128CbcDec::new(key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| FernetError::Crypto("invalid block padding".to_string()))
    }

    pub(crate) fn hmac_sha256(key: &[u8; 16], data: &[u8]) -> Result<[u8; 32], FernetError> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
            .map_err(|_| FernetError::Crypto("invalid HMAC key length".to_string()))?;
        Mac::update(&mut mac, data);
        Ok(mac.finalize().into_bytes().into())
    }

    pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }

    pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
        a.ct_eq(b).into()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        aes128_cbc_decrypt, aes128_cbc_encrypt, constant_time_eq, hmac_sha256, random_bytes,
        sha256,
    };

    #[test]
    fn test_random_bytes() {
        let a: [u8; 16] = random_bytes().unwrap();
        let b: [u8; 16] = random_bytes().unwrap();
        assert_ne!(a, b);
        let long: [u8; 32] = random_bytes().unwrap();
        assert_eq!(long.len(), 32);
    }

    #[test]
    fn test_hmac_sha256() {
        let digest = hmac_sha256(&[0x0b; 16], b"Hi There").unwrap();
        assert_eq!(
            hex::encode(digest),
            "492ce020fe2534a5789dc3848806c78f4f6711397f08e7e7a12ca5a4483c8aa6"
        );
    }

    #[test]
    fn test_sha256() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_aes128_cbc() {
        let key = [0u8; 16];
        let iv = [0u8; 16];
        let ciphertext = aes128_cbc_encrypt(&key, &iv, b"hello").unwrap();
        assert_eq!(hex::encode(&ciphertext), "9834ed518cbc8fbe9af3c6ecb75eb8c0");
        assert_eq!(
            aes128_cbc_decrypt(&key, &iv, &ciphertext).unwrap(),
            b"hello".to_vec()
        );

        // A full block of input gains a full block of padding.
        assert_eq!(aes128_cbc_encrypt(&key, &iv, &[7u8; 16]).unwrap().len(), 32);
        assert_eq!(aes128_cbc_encrypt(&key, &iv, b"").unwrap().len(), 16);
    }

    #[test]
    fn test_aes128_cbc_differs_by_key_and_iv() {
        let base = aes128_cbc_encrypt(&[0u8; 16], &[0u8; 16], b"hello world").unwrap();
        let other_key = aes128_cbc_encrypt(&[1u8; 16], &[0u8; 16], b"hello world").unwrap();
        let other_iv = aes128_cbc_encrypt(&[0u8; 16], &[1u8; 16], b"hello world").unwrap();
        assert_ne!(base, other_key);
        assert_ne!(base, other_iv);
    }

    #[test]
    fn test_aes128_cbc_tampered() {
        let key = [0u8; 16];
        let iv = [0u8; 16];
        // Flipping a bit in a single-block ciphertext scrambles the whole block,
        // padding included.
        let mut tampered = aes128_cbc_encrypt(&key, &iv, b"hello").unwrap();
        tampered[15] ^= 0x01;
        assert_ne!(aes128_cbc_decrypt(&key, &iv, &tampered).ok(), Some(b"hello".to_vec()));
    }
}
