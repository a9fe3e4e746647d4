//! Mnemonic handling and account address derivation.
//!
//! ```text
//! 24 words ──BIP-39──▶ 64-byte seed ──BIP-32 m/44'/118'/0'/0/0──▶ secp256k1 key
//!   ──▶ compressed pubkey ──SHA-256 + RIPEMD-160──▶ 20 bytes ──bech32("tickfy")──▶ address
//! ```
//!
//! The mapping is total and deterministic, which is what lets the vault detect
//! a second import of the same key.

use crate::error::CryptoError;
use bech32::{Bech32, Hrp};
use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use rand::RngCore;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use tickfy_types::constants::{ACCOUNT_HRP, DERIVATION_PATH, MNEMONIC_ENTROPY_BYTES};
use zeroize::Zeroizing;

/// Collapse runs of whitespace and lowercase the phrase.
pub fn normalize_mnemonic(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse and checksum-verify an English BIP-39 phrase.
pub fn validate_mnemonic(phrase: &str) -> Result<Mnemonic, CryptoError> {
    let normalized = normalize_mnemonic(phrase);
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))
}

/// Generate a fresh 24-word phrase from 256 bits of OS randomness.
pub fn generate_mnemonic() -> Result<String, CryptoError> {
    let mut entropy = Zeroizing::new([0u8; MNEMONIC_ENTROPY_BYTES]);
    rand::rngs::OsRng.fill_bytes(&mut entropy[..]);
    let mnemonic = Mnemonic::from_entropy(&entropy[..])
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Compressed secp256k1 public key at the wallet's fixed HD path.
pub fn derive_public_key(phrase: &str) -> Result<[u8; 33], CryptoError> {
    let mnemonic = validate_mnemonic(phrase)?;
    let seed = Zeroizing::new(mnemonic.to_seed(""));

    let path: DerivationPath = DERIVATION_PATH
        .parse()
        .map_err(|e: bip32::Error| CryptoError::KeyDerivation(e.to_string()))?;
    let private_key = XPrv::derive_from_path(&seed[..], &path)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(private_key.public_key().to_bytes())
}

/// Bech32 account address for a 33-byte compressed public key.
pub fn address_from_public_key(public_key: &[u8]) -> Result<String, CryptoError> {
    let sha = Sha256::digest(public_key);
    let account_id = Ripemd160::digest(sha);
    let hrp = Hrp::parse(ACCOUNT_HRP).map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, account_id.as_slice())
        .map_err(|e| CryptoError::InvalidAddress(e.to_string()))
}

/// Derive the account address of a mnemonic.
///
/// Fails with [`CryptoError::InvalidMnemonic`] before any derivation happens
/// if the phrase does not pass the wordlist and checksum checks.
pub fn derive_address(phrase: &str) -> Result<String, CryptoError> {
    let public_key = derive_public_key(phrase)?;
    address_from_public_key(&public_key)
}

/// Decode an account address, returning its 20-byte account id.
pub fn decode_address(address: &str) -> Result<Vec<u8>, CryptoError> {
    let (hrp, data) =
        bech32::decode(address).map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
    if hrp.as_str() != ACCOUNT_HRP {
        return Err(CryptoError::InvalidAddress(format!(
            "expected prefix {}, got {}",
            ACCOUNT_HRP,
            hrp.as_str()
        )));
    }
    if data.len() != 20 {
        return Err(CryptoError::InvalidAddress(format!(
            "expected 20-byte account id, got {}",
            data.len()
        )));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    // BIP-39 test vector: all-zero 256-bit entropy.
    const ZERO_24: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
        abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon \
        abandon abandon abandon abandon abandon art";

    #[test]
    fn test_generate_mnemonic_has_24_words() {
        let phrase = generate_mnemonic().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
        assert!(validate_mnemonic(&phrase).is_ok());
    }

    #[test]
    fn test_generated_mnemonics_differ() {
        assert_ne!(generate_mnemonic().unwrap(), generate_mnemonic().unwrap());
    }

    #[test]
    fn test_bad_checksum_rejected() {
        // Last word swapped: checksum no longer matches.
        let bad = ZERO_24.replace(" art", " abandon");
        assert!(matches!(validate_mnemonic(&bad), Err(CryptoError::InvalidMnemonic(_))));
    }

    #[test]
    fn test_unknown_word_rejected() {
        let bad = ZERO_24.replacen("abandon", "blockchainz", 1);
        assert!(matches!(derive_address(&bad), Err(CryptoError::InvalidMnemonic(_))));
        assert!(matches!(derive_address(""), Err(CryptoError::InvalidMnemonic(_))));
    }

    #[test]
    fn test_address_is_deterministic() {
        let a = derive_address(ZERO_24).unwrap();
        let b = derive_address(ZERO_24).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("tickfy1"));
    }

    #[test]
    fn test_whitespace_and_case_do_not_change_address() {
        let messy = format!("  {}  ", ZERO_24.to_uppercase().replace(' ', "\n  "));
        assert_eq!(derive_address(&messy).unwrap(), derive_address(ZERO_24).unwrap());
    }

    #[test]
    fn test_address_decodes_to_account_id() {
        let address = derive_address(ZERO_24).unwrap();
        let account_id = decode_address(&address).unwrap();
        assert_eq!(account_id.len(), 20);
        assert_eq!(address_from_public_key(&derive_public_key(ZERO_24).unwrap()).unwrap(), address);
    }

    #[test]
    fn test_public_key_is_compressed() {
        let pk = derive_public_key(ZERO_24).unwrap();
        assert!(pk[0] == 0x02 || pk[0] == 0x03);
    }

    #[test]
    fn test_different_mnemonics_give_different_addresses() {
        let other = generate_mnemonic().unwrap();
        assert_ne!(derive_address(&other).unwrap(), derive_address(ZERO_24).unwrap());
    }

    #[test]
    fn test_decode_rejects_foreign_prefix() {
        let hrp = Hrp::parse("cosmos").unwrap();
        let foreign = bech32::encode::<Bech32>(hrp, &[7u8; 20]).unwrap();
        assert!(matches!(decode_address(&foreign), Err(CryptoError::InvalidAddress(_))));
    }
}
