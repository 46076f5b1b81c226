// Quire - A component-based CMS built with Rust
// Copyright (C) 2025 Quire Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Argon2id password hashing with self-describing PHC encoded hashes.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{Output, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ARGON2ID: &str = "argon2id";
const SUPPORTED_VERSION: u32 = 0x13;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("invalid password hash format")]
    InvalidHashFormat,
    #[error("incompatible argon2 version")]
    IncompatibleVersion,
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// Tunable Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
    #[serde(default = "default_salt_len")]
    pub salt_len: usize,
    #[serde(default = "default_output_len")]
    pub output_len: usize,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
            salt_len: default_salt_len(),
            output_len: default_output_len(),
        }
    }
}

fn default_memory_kib() -> u32 {
    64 * 1024
}

fn default_iterations() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    2
}

fn default_salt_len() -> usize {
    16
}

fn default_output_len() -> usize {
    32
}

#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    params: HashParams,
}

impl PasswordHasher {
    pub fn new(params: HashParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HashParams {
        &self.params
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = vec![0u8; self.params.salt_len];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;

        let params = Params::new(
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            Some(self.params.output_len),
        )
        .map_err(|e| PasswordError::Hashing(e.to_string()))?;

        let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify a password against an encoded hash.
    ///
    /// Uses the parameters embedded in `encoded`, not the hasher's own, so
    /// hashes produced under older cost settings keep verifying. A wrong
    /// password is `Ok(false)`; only an unreadable hash is an error.
    pub fn verify(&self, password: &str, encoded: &str) -> Result<bool, PasswordError> {
        let parsed = parse(encoded)?;
        let Some(stored) = parsed.hash else {
            return Err(PasswordError::InvalidHashFormat);
        };

        let derived = derive(password, &parsed, stored.len())?;
        let Ok(derived) = Output::new(&derived) else {
            return Ok(false);
        };

        // Output equality is constant-time
        Ok(derived == stored)
    }
}

/// Re-derive the digest for `password` using the parameters and salt embedded in `encoded`.
pub fn rederive(password: &str, encoded: &str) -> Result<Vec<u8>, PasswordError> {
    let parsed = parse(encoded)?;
    let len = parsed
        .hash
        .map(|h| h.len())
        .ok_or(PasswordError::InvalidHashFormat)?;
    derive(password, &parsed, len)
}

/// Decode the stored digest bytes of an encoded hash.
pub fn stored_digest(encoded: &str) -> Result<Vec<u8>, PasswordError> {
    let parsed = parse(encoded)?;
    parsed
        .hash
        .map(|h| h.as_bytes().to_vec())
        .ok_or(PasswordError::InvalidHashFormat)
}

fn parse(encoded: &str) -> Result<PasswordHash<'_>, PasswordError> {
    let parsed = PasswordHash::new(encoded).map_err(|_| PasswordError::InvalidHashFormat)?;

    if parsed.algorithm.as_str() != ARGON2ID {
        return Err(PasswordError::InvalidHashFormat);
    }

    match parsed.version {
        Some(SUPPORTED_VERSION) => Ok(parsed),
        Some(_) => Err(PasswordError::IncompatibleVersion),
        None => Err(PasswordError::InvalidHashFormat),
    }
}

fn derive(password: &str, parsed: &PasswordHash<'_>, len: usize) -> Result<Vec<u8>, PasswordError> {
    let param = |name: &str| {
        parsed
            .params
            .get_decimal(name)
            .ok_or(PasswordError::InvalidHashFormat)
    };
    let params = Params::new(param("m")?, param("t")?, param("p")?, Some(len))
        .map_err(|_| PasswordError::InvalidHashFormat)?;

    let salt = parsed.salt.ok_or(PasswordError::InvalidHashFormat)?;
    let mut salt_buf = [0u8; 64];
    let salt_bytes = salt
        .decode_b64(&mut salt_buf)
        .map_err(|_| PasswordError::InvalidHashFormat)?;

    let mut out = vec![0u8; len];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt_bytes, &mut out)
        .map_err(|_| PasswordError::InvalidHashFormat)?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
            ..HashParams::default()
        })
    }

    #[test]
    fn test_default_params() {
        let params = HashParams::default();
        assert_eq!(params.memory_kib, 65536);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 2);
        assert_eq!(params.salt_len, 16);
        assert_eq!(params.output_len, 32);
    }

    #[test]
    fn test_hash_encoding_is_self_describing() {
        let hash = fast_hasher().hash("secretpw").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
    }

    #[test]
    fn test_hash_with_default_params_verifies() {
        let hasher = PasswordHasher::default();
        let hash = hasher.hash("correct horse").unwrap();
        assert!(hash.contains("m=65536,t=3,p=2"));
        assert!(hasher.verify("correct horse", &hash).unwrap());
    }

    #[test]
    fn test_verify_round_trip() {
        let hasher = fast_hasher();
        for password in ["secretpw", "p@ssw0rd!", "ünïcødé", "a much longer pass phrase"] {
            let hash = hasher.hash(password).unwrap();
            assert!(hasher.verify(password, &hash).unwrap(), "{}", password);
        }
    }

    #[test]
    fn test_single_character_mutation_fails() {
        let hasher = fast_hasher();
        let password = "secretpw";
        let hash = hasher.hash(password).unwrap();

        for i in 0..password.len() {
            let mut mutated = password.as_bytes().to_vec();
            mutated[i] = if mutated[i] == b'x' { b'y' } else { b'x' };
            let mutated = String::from_utf8(mutated).unwrap();
            assert!(!hasher.verify(&mutated, &hash).unwrap(), "{}", mutated);
        }
    }

    #[test]
    fn test_salts_are_unique() {
        let hasher = fast_hasher();
        let a = hasher.hash("secretpw").unwrap();
        let b = hasher.hash("secretpw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rederive_reproduces_stored_digest() {
        let hash = fast_hasher().hash("secretpw").unwrap();
        let derived = rederive("secretpw", &hash).unwrap();
        assert_eq!(derived, stored_digest(&hash).unwrap());
        assert_eq!(derived.len(), 32);
    }

    #[test]
    fn test_verify_tolerates_parameter_drift() {
        let old = fast_hasher().hash("secretpw").unwrap();
        let current = PasswordHasher::new(HashParams {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
            ..HashParams::default()
        });
        assert!(current.verify("secretpw", &old).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_invalid_format() {
        let hasher = fast_hasher();
        for bad in ["", "not-a-hash", "$argon2id$", "$bcrypt$v=19$m=1,t=1,p=1$abc$def"] {
            assert_eq!(
                hasher.verify("secretpw", bad),
                Err(PasswordError::InvalidHashFormat),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_unsupported_version_is_incompatible() {
        let hash = fast_hasher().hash("secretpw").unwrap();
        let old_version = hash.replace("$v=19$", "$v=16$");
        assert_eq!(
            fast_hasher().verify("secretpw", &old_version),
            Err(PasswordError::IncompatibleVersion)
        );
    }
}
