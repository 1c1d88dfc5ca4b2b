use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Config {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Config {
    /// Parameters for password-protected carriers. Not stored in the
    /// payload, so changing them breaks every existing image.
    pub const PAYLOAD: Self = Self {
        memory_kib: 19 * 1024,
        iterations: 2,
        parallelism: 1,
    };

    pub fn memory_mib(&self) -> u32 {
        self.memory_kib / 1024
    }
}

pub const KEY_LEN: usize = 32;
pub const MIN_SALT_LEN: usize = 16;

pub fn derive_payload_key(
    password: &[u8],
    salt: &[u8],
    config: Argon2Config,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if password.is_empty() {
        return Err(Error::KeyDerivation("password cannot be empty".to_string()));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(Error::KeyDerivation(format!(
            "salt too short ({} bytes, minimum is {})",
            salt.len(),
            MIN_SALT_LEN
        )));
    }

    let params = Params::new(
        config.memory_kib,
        config.iterations,
        config.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| Error::KeyDerivation(format!("invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password, salt, &mut *key)
        .map_err(|e| Error::KeyDerivation(format!("Argon2 derivation failed: {:?}", e)))?;

    Ok(key)
}
