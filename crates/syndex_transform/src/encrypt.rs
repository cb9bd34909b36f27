//! AES-256-GCM encryption transform.
//!
//! The key is derived from a password and salt with HKDF-SHA256. Salt and
//! password provisioning is an external credential concern; nothing in this
//! module generates or persists them.
//!
//! Frame layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)` with a
//! fresh random nonce per encode. Decoding verifies the authentication tag,
//! so tampered frames and wrong passwords fail rather than decode garbage.

use crate::error::{TransformError, TransformResult};
use crate::transform::DataTransform;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the derived AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;
/// Required salt length in bytes.
pub const SALT_SIZE: usize = 16;

const KEY_INFO: &[u8] = b"syndex.store.key.v1";

/// Password and salt for the cipher transform.
///
/// Wiped on drop; `Debug` never prints the password.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    password: String,
    salt: [u8; SALT_SIZE],
}

impl Credentials {
    /// Creates credentials from a password and a 16-byte salt.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is empty or the salt is not exactly
    /// [`SALT_SIZE`] bytes.
    pub fn new(password: impl Into<String>, salt: &[u8]) -> TransformResult<Self> {
        let password = password.into();
        if password.is_empty() {
            return Err(TransformError::EmptyPassword);
        }
        if salt.len() != SALT_SIZE {
            return Err(TransformError::InvalidSaltLength {
                expected: SALT_SIZE,
                actual: salt.len(),
            });
        }
        let mut salt_bytes = [0u8; SALT_SIZE];
        salt_bytes.copy_from_slice(salt);
        Ok(Self {
            password,
            salt: salt_bytes,
        })
    }

    /// Derives the fixed-length symmetric key.
    fn derive_key(&self) -> TransformResult<[u8; KEY_SIZE]> {
        let hkdf = Hkdf::<Sha256>::new(Some(&self.salt), self.password.as_bytes());
        let mut key = [0u8; KEY_SIZE];
        hkdf.expand(KEY_INFO, &mut key)
            .map_err(|e| TransformError::encryption(e.to_string()))?;
        Ok(key)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("password", &"[REDACTED]")
            .field("salt", &self.salt)
            .finish()
    }
}

/// AES-256-GCM transform keyed from [`Credentials`].
pub struct CipherTransform {
    cipher: Aes256Gcm,
}

impl CipherTransform {
    /// Builds the transform, deriving the key from the credentials.
    ///
    /// Construction is the only fallible step; a bad configuration surfaces
    /// here, at store open time.
    pub fn new(credentials: &Credentials) -> TransformResult<Self> {
        let mut key = credentials.derive_key()?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        key.zeroize();
        Ok(Self { cipher })
    }
}

impl DataTransform for CipherTransform {
    fn encode(&self, data: &[u8]) -> TransformResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, data)
            .map_err(|_| TransformError::encryption("AEAD encryption failed"))?;

        let mut framed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        framed.extend_from_slice(&nonce_bytes);
        framed.extend_from_slice(&ciphertext);
        Ok(framed)
    }

    fn decode(&self, data: &[u8]) -> TransformResult<Vec<u8>> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(TransformError::decryption("frame too short"));
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| TransformError::decryption("authentication failed"))
    }
}

impl std::fmt::Debug for CipherTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherTransform").finish_non_exhaustive()
    }
}
