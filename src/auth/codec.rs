use std::{fmt, str::FromStr};

use aes::cipher::{KeyIvInit, StreamCipher};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

use crate::config::CredentialConfig;

/// AES-256 in counter mode with a 128-bit big-endian counter (OpenSSL `aes-256-ctr`).
type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

pub const IV_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("cipher initialization failed: {0}")]
    CipherInit(String),
    #[error("malformed encoded secret: {0}")]
    MalformedEncoding(&'static str),
    #[error("decrypted secret is not valid utf-8")]
    InvalidUtf8,
}

/// IV and ciphertext of one encrypted credential, both hex encoded.
///
/// Stored as `<ivHex>:<cipherHex>`; see the `Display` and `FromStr` impls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSecret {
    pub iv_hex: String,
    pub cipher_hex: String,
}

impl fmt::Display for EncodedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.iv_hex, self.cipher_hex)
    }
}

impl FromStr for EncodedSecret {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (iv_hex, cipher_hex) = s
            .split_once(':')
            .ok_or(CryptoError::MalformedEncoding("missing ':' separator"))?;
        if iv_hex.len() != IV_LEN * 2 {
            return Err(CryptoError::MalformedEncoding("iv must be 16 bytes"));
        }
        Ok(Self {
            iv_hex: iv_hex.to_string(),
            cipher_hex: cipher_hex.to_string(),
        })
    }
}

/// Symmetric password codec.
///
/// The key is derived with scrypt from the configured secret and salt the
/// first time it is needed and cached for the lifetime of the codec. Each
/// encryption draws a fresh random IV.
pub struct CredentialCodec {
    secret: String,
    salt: String,
    log_n: u8,
    key: OnceCell<[u8; KEY_LEN]>,
}

impl CredentialCodec {
    pub fn new(cfg: &CredentialConfig) -> Self {
        Self {
            secret: cfg.secret.clone(),
            salt: cfg.salt.clone(),
            log_n: cfg.scrypt_log_n,
            key: OnceCell::new(),
        }
    }

    /// Returns the cached key, deriving it on the blocking pool on first use.
    /// Concurrent first callers wait on the same derivation.
    async fn key(&self) -> Result<&[u8; KEY_LEN], CryptoError> {
        self.key
            .get_or_try_init(|| async {
                let secret = self.secret.clone();
                let salt = self.salt.clone();
                let log_n = self.log_n;
                let key = tokio::task::spawn_blocking(move || derive_key(&secret, &salt, log_n))
                    .await
                    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))??;
                debug!(log_n, "credential key derived");
                Ok::<_, CryptoError>(key)
            })
            .await
    }

    pub async fn encode(&self, plaintext: &str) -> Result<EncodedSecret, CryptoError> {
        let key = self.key().await?;
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let mut buf = plaintext.as_bytes().to_vec();
        apply_keystream(key, &iv, &mut buf)?;

        Ok(EncodedSecret {
            iv_hex: hex::encode(iv),
            cipher_hex: hex::encode(buf),
        })
    }

    pub async fn decode(&self, encoded: &EncodedSecret) -> Result<String, CryptoError> {
        let iv = hex::decode(&encoded.iv_hex)
            .map_err(|_| CryptoError::MalformedEncoding("iv is not hex"))?;
        if iv.len() != IV_LEN {
            return Err(CryptoError::MalformedEncoding("iv must be 16 bytes"));
        }
        let mut buf = hex::decode(&encoded.cipher_hex)
            .map_err(|_| CryptoError::MalformedEncoding("ciphertext is not hex"))?;

        let key = self.key().await?;
        apply_keystream(key, &iv, &mut buf)?;
        String::from_utf8(buf).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Encrypts `plaintext` into the persisted `<ivHex>:<cipherHex>` form.
    pub async fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        Ok(self.encode(plaintext).await?.to_string())
    }

    /// Checks `plaintext` against a persisted value produced by [`seal`](Self::seal).
    pub async fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, CryptoError> {
        let decoded = match stored.parse::<EncodedSecret>() {
            Ok(encoded) => self.decode(&encoded).await,
            Err(e) => Err(e),
        };
        match decoded {
            Ok(decoded) => Ok(decoded == plaintext),
            // A different key yields garbage bytes; that is a mismatch, not a failure.
            Err(CryptoError::InvalidUtf8) => Ok(false),
            Err(CryptoError::MalformedEncoding(reason)) => {
                warn!(reason, "stored credential is malformed");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

fn derive_key(secret: &str, salt: &str, log_n: u8) -> Result<[u8; KEY_LEN], CryptoError> {
    let params = scrypt::Params::new(log_n, 8, 1, KEY_LEN).map_err(|e| {
        error!(error = %e, log_n, "invalid scrypt parameters");
        CryptoError::KeyDerivation(e.to_string())
    })?;
    let mut key = [0u8; KEY_LEN];
    scrypt::scrypt(secret.as_bytes(), salt.as_bytes(), &params, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

fn apply_keystream(key: &[u8; KEY_LEN], iv: &[u8], buf: &mut [u8]) -> Result<(), CryptoError> {
    let mut cipher = Aes256Ctr::new_from_slices(key, iv)
        .map_err(|e| CryptoError::CipherInit(e.to_string()))?;
    cipher.apply_keystream(buf);
    Ok(())
}

#[cfg(test)]
impl CredentialCodec {
    /// Codec with an already derived key, skipping scrypt.
    pub fn with_key(key: [u8; KEY_LEN]) -> Self {
        Self {
            secret: String::new(),
            salt: String::new(),
            log_n: 0,
            key: OnceCell::new_with(Some(key)),
        }
    }

    /// Cheap scrypt parameters for unit tests.
    pub fn for_tests() -> Self {
        Self::new(&CredentialConfig {
            secret: "test-secret".into(),
            salt: "salt".into(),
            scrypt_log_n: 4,
        })
    }
}
