//! Password-based authenticated encryption for share envelopes.
//!
//! Key derivation is PBKDF2-HMAC-SHA256 over the UTF-8 password bytes with a
//! random 16-byte salt; the payload is sealed with AES-256-GCM under a random
//! 12-byte nonce. Salt and nonce must be fresh per encryption; both are drawn
//! from the OS RNG.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use super::error::Error;

/// PBKDF2 iteration count, fixed across all encrypted envelopes.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Random salt length in bytes.
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

fn derive_key(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Encrypts `plaintext`, returning (salt, nonce, ciphertext-with-tag).
pub fn seal(password: &str, plaintext: &[u8]) -> Result<([u8; SALT_LEN], [u8; NONCE_LEN], Vec<u8>), Error> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| Error::Encryption)?;
    Ok((salt, nonce, ciphertext))
}

/// Decrypts a sealed body. An authentication failure means the password is
/// wrong or the data was tampered with; both surface as [`Error::WrongPassword`].
pub fn open(password: &str, salt: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
    if salt.len() != SALT_LEN || nonce.len() != NONCE_LEN || ciphertext.len() < TAG_LEN {
        return Err(Error::TruncatedEnvelope);
    }
    let key = derive_key(password, salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::WrongPassword)
}
