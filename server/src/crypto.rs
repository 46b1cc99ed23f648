//! Secret handling for data-source credentials.
//!
//! Secrets are stored as one JSON object per record, encrypted with
//! AES-256-GCM and encoded as base64(12-byte nonce ‖ ciphertext+tag).

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand_core::{OsRng, RngCore};

const NONCE_LEN: usize = 12;

#[derive(Debug)]
pub enum CryptoError {
    Encrypt(String),
    Decrypt(String),
    Decode(String),
    Key(String),
    Json(serde_json::Error),
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoError::Encrypt(e) => write!(f, "Encryption error: {e}"),
            CryptoError::Decrypt(e) => write!(f, "Decryption error: {e}"),
            CryptoError::Decode(e) => write!(f, "Base64 decode error: {e}"),
            CryptoError::Key(e) => write!(f, "Invalid encryption key: {e}"),
            CryptoError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for CryptoError {}

pub fn encrypt_json(data: &serde_json::Value, key: &[u8; 32]) -> Result<String, CryptoError> {
    let plaintext = serde_json::to_vec(data).map_err(CryptoError::Json)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(key.into());
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_ref())
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

    let mut combined = nonce_bytes.to_vec();
    combined.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(&combined))
}

pub fn decrypt_json(encoded: &str, key: &[u8; 32]) -> Result<serde_json::Value, CryptoError> {
    let data = STANDARD
        .decode(encoded)
        .map_err(|e| CryptoError::Decode(e.to_string()))?;

    if data.len() < NONCE_LEN {
        return Err(CryptoError::Decrypt(format!(
            "ciphertext too short (< {NONCE_LEN} bytes)"
        )));
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(key.into());
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CryptoError::Decrypt(e.to_string()))?;

    serde_json::from_slice(&plaintext).map_err(CryptoError::Json)
}

/// `Authorization` header value for HTTP Basic auth.
pub fn basic_auth_header(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// Parse a 64-char hex string into a 32-byte key.
pub fn parse_hex_key(hex: &str) -> Result<[u8; 32], CryptoError> {
    if hex.len() != 64 {
        return Err(CryptoError::Key(format!(
            "expected 64 hex chars (32 bytes), got {}",
            hex.len()
        )));
    }
    let mut key = [0u8; 32];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let byte_str = std::str::from_utf8(chunk)
            .map_err(|_| CryptoError::Key("invalid UTF-8 in hex string".to_string()))?;
        key[i] = u8::from_str_radix(byte_str, 16)
            .map_err(|_| CryptoError::Key(format!("invalid hex character at byte {i}")))?;
    }
    Ok(key)
}

pub fn random_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}
