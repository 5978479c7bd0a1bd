//! Password hashing with argon2id.
//!
//! Digests are PHC strings (`$argon2id$v=19$m=...`), so the cost used to
//! produce a digest travels with it and verification keeps working after the
//! configured cost is raised.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::sync::{Arc, OnceLock};

/// Secret behind the decoy digest. Its verification result is never used.
const DECOY_SECRET: &str = "chirpy-decoy-secret";

/// Errors from hashing or verifying a secret.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// The hashing primitive failed. Never caused by a wrong password.
    #[error("failed to hash secret: {0}")]
    HashingFailure(String),
    /// The stored digest could not be parsed.
    #[error("stored password digest is malformed: {0}")]
    MalformedDigest(String),
}

/// Tunable argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory size in KiB.
    pub memory_kib: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// One-way hasher for user passwords.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Digest verified when no account exists, built lazily at the configured cost
    decoy: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    /// Create a hasher with the given cost. Fails if argon2 rejects the parameters.
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::HashingFailure(e.to_string()))?;
        Ok(Self {
            params,
            decoy: Arc::default(),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext secret with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailure(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a plaintext secret against a stored digest.
    ///
    /// Returns `Ok(false)` for a wrong secret. Only a corrupt digest is an error.
    pub fn verify(&self, secret: &str, digest: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(digest).map_err(|e| PasswordError::MalformedDigest(e.to_string()))?;

        match self.argon2().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedDigest(e.to_string())),
        }
    }

    fn decoy_digest(&self) -> Result<&str, PasswordError> {
        if let Some(digest) = self.decoy.get() {
            return Ok(digest);
        }
        let digest = self.hash(DECOY_SECRET)?;
        Ok(self.decoy.get_or_init(|| digest))
    }

    /// Verify `secret` against a digest no account owns and discard the result.
    ///
    /// Lets a lookup miss cost as much as a wrong password.
    pub fn verify_decoy(&self, secret: &str) -> Result<(), PasswordError> {
        let digest = self.decoy_digest()?;
        self.verify(secret, digest)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn decoy_built(&self) -> bool {
        self.decoy.get().is_some()
    }

    /// [`hash`](Self::hash) on the blocking thread pool.
    pub async fn hash_blocking(&self, secret: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| PasswordError::HashingFailure(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool.
    pub async fn verify_blocking(
        &self,
        secret: String,
        digest: String,
    ) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&secret, &digest))
            .await
            .map_err(|e| PasswordError::HashingFailure(e.to_string()))?
    }

    /// [`verify_decoy`](Self::verify_decoy) on the blocking thread pool.
    pub async fn verify_decoy_blocking(&self, secret: String) -> Result<(), PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_decoy(&secret))
            .await
            .map_err(|e| PasswordError::HashingFailure(e.to_string()))?
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
            decoy: Arc::default(),
        }
    }
}
