//! Password envelope for wallet secrets.
//!
//! The key is a single SHA-256 pass over `password || salt`, where the salt is
//! the hex string stored next to the ciphertext. The sealed output is
//! `nonce (12 bytes) || AES-256-GCM ciphertext + tag`, hex-encoded.
//!
//! There is no work factor on the password hash. Existing stores depend on
//! this exact derivation, so it stays until a versioned format is introduced.

use crate::error::CryptoError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tickfy_types::constants::SALT_BYTES;
use zeroize::Zeroizing;

/// AES-GCM nonce size (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Generate a fresh per-wallet salt, hex-encoded.
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    hex::encode(salt)
}

fn derive_key(password: &str, salt: &str) -> Zeroizing<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    Zeroizing::new(hasher.finalize().into())
}

/// Encrypt `plaintext` under a key derived from `password` and `salt`.
///
/// Returns hex of `nonce || ciphertext`. A fresh nonce is drawn on every call,
/// so encrypting the same input twice yields different output.
#[allow(deprecated)] // aes-gcm 0.10 uses generic-array 0.x
pub fn encrypt(plaintext: &str, password: &str, salt: &str) -> Result<String, CryptoError> {
    let key_bytes = derive_key(password, salt);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let key = Key::<Aes256Gcm>::from_slice(&key_bytes[..]);
    let cipher = Aes256Gcm::new(key);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(hex::encode(sealed))
}

/// Decrypt hex produced by [`encrypt`].
///
/// Every failure (bad hex, input shorter than a nonce, tag mismatch, non-UTF-8
/// plaintext) is reported as [`CryptoError::Authentication`].
#[allow(deprecated)] // aes-gcm 0.10 uses generic-array 0.x
pub fn decrypt(cipher_hex: &str, password: &str, salt: &str) -> Result<String, CryptoError> {
    let sealed = hex::decode(cipher_hex.trim()).map_err(|_| CryptoError::Authentication)?;
    if sealed.len() < NONCE_SIZE {
        return Err(CryptoError::Authentication);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    let key_bytes = derive_key(password, salt);
    let key = Key::<Aes256Gcm>::from_slice(&key_bytes[..]);
    let cipher = Aes256Gcm::new(key);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::Authentication)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "abandon ability able about above absent absorb abstract";

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let salt = generate_salt();
        let sealed = encrypt(PHRASE, "secret1", &salt).unwrap();
        assert_eq!(decrypt(&sealed, "secret1", &salt).unwrap(), PHRASE);
    }

    #[test]
    fn test_roundtrip_various_inputs() {
        let cases = [
            ("", "p"),
            ("x", ""),
            ("unicode: ção ✓", "pässwörd"),
            ("a much longer secret that spans several AES blocks of input data", "123456"),
        ];
        for (plaintext, password) in cases {
            let salt = generate_salt();
            let sealed = encrypt(plaintext, password, &salt).unwrap();
            assert_eq!(decrypt(&sealed, password, &salt).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_wrong_password_fails() {
        let salt = generate_salt();
        let sealed = encrypt(PHRASE, "correct_password", &salt).unwrap();
        for wrong in ["wrong_password", "correct_passwor", "correct_password ", ""] {
            assert!(matches!(
                decrypt(&sealed, wrong, &salt),
                Err(CryptoError::Authentication)
            ));
        }
    }

    #[test]
    fn test_wrong_salt_fails() {
        let sealed = encrypt(PHRASE, "pw", "00112233").unwrap();
        assert!(matches!(
            decrypt(&sealed, "pw", "00112234"),
            Err(CryptoError::Authentication)
        ));
    }

    #[test]
    fn test_truncated_input_fails() {
        let short = hex::encode([0u8; NONCE_SIZE - 1]);
        assert!(matches!(decrypt(&short, "pw", "salt"), Err(CryptoError::Authentication)));
        assert!(matches!(decrypt("", "pw", "salt"), Err(CryptoError::Authentication)));
    }

    #[test]
    fn test_corrupted_ciphertext_fails() {
        let salt = generate_salt();
        let sealed = encrypt(PHRASE, "pw", &salt).unwrap();
        let mut bytes = hex::decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(
            decrypt(&hex::encode(bytes), "pw", &salt),
            Err(CryptoError::Authentication)
        ));
        assert!(matches!(decrypt("zz-not-hex", "pw", &salt), Err(CryptoError::Authentication)));
    }

    #[test]
    fn test_different_encryptions_differ() {
        let salt = generate_salt();
        let e1 = encrypt(PHRASE, "pass", &salt).unwrap();
        let e2 = encrypt(PHRASE, "pass", &salt).unwrap();
        assert_ne!(e1, e2);
        assert_ne!(e1[..NONCE_SIZE * 2], e2[..NONCE_SIZE * 2]);
    }

    #[test]
    fn test_sealed_layout() {
        let sealed = encrypt("abc", "pw", "s").unwrap();
        // nonce + 3 bytes of ciphertext + 16-byte tag
        assert_eq!(hex::decode(sealed).unwrap().len(), NONCE_SIZE + 3 + 16);
    }

    #[test]
    fn test_salt_format() {
        let salt = generate_salt();
        assert_eq!(salt.len(), SALT_BYTES * 2);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(salt, generate_salt());
    }
}
