//! Credential hashing and verification (Argon2id, PHC strings at rest)

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::config::SecurityConfig;

#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("credential hashing failed: {0}")]
    HashFailed(String),
    #[error("stored credential hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hashes new credentials with fixed Argon2id cost parameters.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(config: &SecurityConfig) -> Result<Self, AuthError> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| AuthError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a credential, returning a PHC-format string.
    pub fn hash(&self, credential: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(credential.as_bytes(), &salt)
            .map_err(|e| AuthError::HashFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a presented credential against a stored PHC hash.
    ///
    /// The cost parameters embedded in the hash are used, so hashes written
    /// under older settings keep verifying.
    pub fn verify(&self, credential: &str, stored: &str) -> Result<bool, AuthError> {
        let parsed =
            PasswordHash::new(stored).map_err(|e| AuthError::MalformedHash(e.to_string()))?;
        Ok(self
            .argon2()
            .verify_password(credential.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(&SecurityConfig {
        argon2_memory_kib: 64,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    })
    .unwrap()
}
