//! Serialized form of the hidden mnemonic.
//!
//! Plain:     `len (u32 BE) || text`
//! Password:  `salt (16) || nonce (12) || ChaCha20-Poly1305(plain) || tag (16)`
//!
//! The key is Argon2id(password, salt) with [`Argon2Config::PAYLOAD`]. The
//! caller always knows which form to expect, so there is no mode marker.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::kdf::{Argon2Config, derive_payload_key};

pub const LENGTH_PREFIX_LEN: usize = 4;
pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const ENCRYPTION_OVERHEAD: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

fn active(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}

pub fn encode(text: &str, password: Option<&str>) -> Result<Vec<u8>> {
    let len = u32::try_from(text.len()).map_err(|_| Error::MalformedPayload("text too long"))?;

    let mut plain = Zeroizing::new(Vec::with_capacity(LENGTH_PREFIX_LEN + text.len()));
    plain.extend_from_slice(&len.to_be_bytes());
    plain.extend_from_slice(text.as_bytes());

    let Some(password) = active(password) else {
        debug!(bytes = plain.len(), "built plain payload");
        return Ok(plain.to_vec());
    };

    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .and_then(|_| OsRng.try_fill_bytes(&mut nonce_bytes))
        .map_err(|e| Error::EntropySource(e.to_string()))?;

    let key = derive_payload_key(password.as_bytes(), &salt, Argon2Config::PAYLOAD)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&*key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plain.as_slice())
        .map_err(|_| Error::MalformedPayload("encryption failed"))?;

    let mut payload = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&nonce_bytes);
    payload.extend_from_slice(&ciphertext);

    debug!(bytes = payload.len(), "built encrypted payload");
    Ok(payload)
}

pub fn decode(payload: &[u8], password: Option<&str>) -> Result<Zeroizing<String>> {
    let Some(password) = active(password) else {
        return parse_plain(payload);
    };

    if payload.len() < ENCRYPTION_OVERHEAD {
        return Err(Error::MalformedPayload("encrypted payload too short"));
    }

    let (salt, rest) = payload.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_payload_key(password.as_bytes(), salt, Argon2Config::PAYLOAD)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&*key));
    let plain = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::AuthenticationFailed)?,
    );

    parse_plain(&plain)
}

fn parse_plain(plain: &[u8]) -> Result<Zeroizing<String>> {
    if plain.len() < LENGTH_PREFIX_LEN {
        return Err(Error::MalformedPayload("missing length prefix"));
    }

    let (prefix, text) = plain.split_at(LENGTH_PREFIX_LEN);
    let declared = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
    if declared != text.len() {
        debug!(declared, available = text.len(), "length prefix mismatch");
        return Err(Error::MalformedPayload("length prefix does not match payload"));
    }

    let text = std::str::from_utf8(text)
        .map_err(|_| Error::MalformedPayload("text is not valid UTF-8"))?;
    Ok(Zeroizing::new(text.to_string()))
}
