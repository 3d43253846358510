//! Encryption of custodial wallet private keys.
//!
//! Keys are protected with AES-256-GCM under a key derived from the wallet
//! password via PBKDF2-HMAC-SHA256. The stored blob is
//! `salt(16) || iv(12) || ciphertext+tag`, base64-encoded. A fresh salt and
//! IV are generated on every call, so encrypting the same key twice yields
//! different blobs.
//!
//! Stateless and CPU-bound; safe to call from concurrently processed
//! donations.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

const KEY_LENGTH: usize = 32; // AES-256
const IV_LENGTH: usize = 12; // GCM nonce length
const SALT_LENGTH: usize = 16;
const ITERATION_COUNT: u32 = 100_000; // PBKDF2 iterations

/// Errors raised by key encryption and decryption
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyStoreError {
    /// GCM tag verification failed; the password is wrong
    #[error("invalid wallet password")]
    InvalidPassword,
    /// Blob is too short to contain salt and IV
    #[error("encrypted private key data is corrupted")]
    CorruptedData,
    /// Any other decryption failure (bad encoding, invalid plaintext)
    #[error("private key decryption failed: {0}")]
    DecryptionFailed(String),
    /// Encryption failure
    #[error("private key encryption failed: {0}")]
    EncryptionFailed(String),
}

/// Encrypt a hex-encoded private key under a password
pub fn encrypt(private_key_hex: &str, password: &str) -> Result<String, KeyStoreError> {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);

    let mut iv = [0u8; IV_LENGTH];
    OsRng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), private_key_hex.as_bytes())
        .map_err(|e| KeyStoreError::EncryptionFailed(e.to_string()))?;

    // salt || iv || ciphertext+tag
    let mut blob = Vec::with_capacity(SALT_LENGTH + IV_LENGTH + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(blob))
}

/// Decrypt an encrypted private key blob with a password
pub fn decrypt(encrypted_private_key: &str, password: &str) -> Result<String, KeyStoreError> {
    let data = BASE64
        .decode(encrypted_private_key)
        .map_err(|e| KeyStoreError::DecryptionFailed(e.to_string()))?;

    if data.len() < SALT_LENGTH + IV_LENGTH {
        return Err(KeyStoreError::CorruptedData);
    }

    let (salt, rest) = data.split_at(SALT_LENGTH);
    let (iv, ciphertext) = rest.split_at(IV_LENGTH);

    let key = derive_key(password, salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    // A failed GCM tag check is indistinguishable from other AEAD failures,
    // and both mean the key material does not match the blob
    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| KeyStoreError::InvalidPassword)?;

    String::from_utf8(plaintext).map_err(|e| KeyStoreError::DecryptionFailed(e.to_string()))
}

/// Check whether a password decrypts the blob.
///
/// Only wrong-password failures are swallowed; corrupted blobs still error.
pub fn validate_password(
    encrypted_private_key: &str,
    password: &str,
) -> Result<bool, KeyStoreError> {
    match decrypt(encrypted_private_key, password) {
        Ok(_) => Ok(true),
        Err(KeyStoreError::InvalidPassword) => Ok(false),
        Err(e) => Err(e),
    }
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LENGTH] {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ITERATION_COUNT, &mut key);
    key
}
