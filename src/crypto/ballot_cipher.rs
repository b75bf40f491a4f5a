//! AES-256-GCM ballot encryption
//!
//! Every call to [`BallotCipher::encrypt`] draws a fresh 256-bit key and a
//! fresh 96-bit nonce, so a nonce is never reused under the same key. The
//! key is returned to the caller and never retained here.
//!
//! Decryption failures are deliberately uniform: a wrong key, a wrong nonce,
//! tampered ciphertext and malformed input all surface as the same
//! [`Error::DecryptionFailure`].

use crate::crypto::hex_codec::HexCodec;
use crate::crypto::random::{OsRandom, RandomSource};
use crate::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroizing;

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;

/// GCM nonce length in bytes
pub const IV_LEN: usize = 12;

/// GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Output of a ballot encryption, every field `0x`-hex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionResult {
    /// Ciphertext followed by the 16-byte tag
    pub ciphertext: String,
    /// 12-byte nonce
    pub iv: String,
    /// Raw 32-byte key
    pub key: String,
}

/// Encrypts and decrypts ballot text
#[derive(Clone)]
pub struct BallotCipher {
    source: Arc<dyn RandomSource>,
}

impl BallotCipher {
    /// Create a cipher drawing keys and nonces from `source`
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    /// Create a cipher backed by the OS CSPRNG
    pub fn with_os_random() -> Self {
        Self::new(Arc::new(OsRandom))
    }

    /// Encrypt the UTF-8 bytes of `plaintext` under a fresh key and nonce
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptionResult> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        self.source.try_fill(&mut key[..])?;

        let mut iv = [0u8; IV_LEN];
        self.source.try_fill(&mut iv)?;

        let ciphertext = seal(&key, &iv, plaintext.as_bytes())?;

        tracing::debug!(
            "🔒 Ballot encrypted: {} plaintext bytes -> {} ciphertext bytes",
            plaintext.len(),
            ciphertext.len()
        );

        Ok(EncryptionResult {
            ciphertext: HexCodec::encode(&ciphertext),
            iv: HexCodec::encode(&iv),
            key: HexCodec::encode(&key[..]),
        })
    }

    /// Decrypt and authenticate a ballot
    pub fn decrypt(&self, ciphertext_hex: &str, iv_hex: &str, key_hex: &str) -> Result<String> {
        let ciphertext = HexCodec::decode(ciphertext_hex).map_err(|_| Error::DecryptionFailure)?;
        let iv: [u8; IV_LEN] =
            HexCodec::decode_array(iv_hex).map_err(|_| Error::DecryptionFailure)?;
        let key: Zeroizing<[u8; KEY_LEN]> = Zeroizing::new(
            HexCodec::decode_array(key_hex).map_err(|_| Error::DecryptionFailure)?,
        );

        let plaintext = Zeroizing::new(open(&key, &iv, &ciphertext)?);

        String::from_utf8(plaintext.to_vec()).map_err(|_| Error::DecryptionFailure)
    }

    /// Decrypt a previously returned [`EncryptionResult`]
    pub fn decrypt_result(&self, result: &EncryptionResult) -> Result<String> {
        self.decrypt(&result.ciphertext, &result.iv, &result.key)
    }
}

impl Default for BallotCipher {
    fn default() -> Self {
        Self::with_os_random()
    }
}

fn seal(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| Error::EncryptionFailure)?;
    cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| Error::EncryptionFailure)
}

fn open(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(Error::DecryptionFailure);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| Error::DecryptionFailure)?;
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| {
            tracing::debug!("Ballot decryption rejected");
            Error::DecryptionFailure
        })
}
