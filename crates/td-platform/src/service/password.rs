//! Password Service
//!
//! Argon2id hashing and verification for account credentials, plus the
//! password strength policy enforced at the API boundary.
//!
//! Argon2 does not truncate its input (unlike bcrypt's 72-byte cap), so
//! the policy's explicit maximum length is the effective input limit and
//! no entropy is lost silently.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};

use crate::error::{AppError, Result};

/// Argon2id cost parameters. The defaults target tens of milliseconds per
/// verification on commodity hardware.
#[derive(Debug, Clone)]
pub struct Argon2Config {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Password strength policy: length bounds plus required character
/// classes, checked before any hashing happens.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 100,
        }
    }
}

impl PasswordPolicy {
    pub fn validate(&self, password: &str) -> Result<()> {
        let len = password.chars().count();
        if len < self.min_length {
            return Err(AppError::validation(format!(
                "password: must be at least {} characters",
                self.min_length
            )));
        }
        if len > self.max_length {
            return Err(AppError::validation(format!(
                "password: must be at most {} characters",
                self.max_length
            )));
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(AppError::validation(
                "password: must contain at least one uppercase letter",
            ));
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(AppError::validation(
                "password: must contain at least one lowercase letter",
            ));
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(
                "password: must contain at least one digit",
            ));
        }
        Ok(())
    }
}

pub struct PasswordService {
    config: Argon2Config,
    pub policy: PasswordPolicy,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(Argon2Config::default(), PasswordPolicy::default())
    }
}

impl PasswordService {
    pub fn new(config: Argon2Config, policy: PasswordPolicy) -> Self {
        Self { config, policy }
    }

    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.config.memory_kib,
            self.config.iterations,
            self.config.parallelism,
            None,
        )
        .map_err(|e| AppError::internal(format!("invalid argon2 parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash. A malformed hash verifies
    /// as false rather than erroring.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let service = PasswordService::default();
        let hash = service.hash_password("SecurePass123").unwrap();
        assert!(service.verify_password("SecurePass123", &hash));
        assert!(!service.verify_password("SecurePass124", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let service = PasswordService::default();
        let a = service.hash_password("SecurePass123").unwrap();
        let b = service.hash_password("SecurePass123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_verifies_false() {
        let service = PasswordService::default();
        assert!(!service.verify_password("SecurePass123", "not-a-phc-string"));
        assert!(!service.verify_password("SecurePass123", ""));
    }

    #[test]
    fn test_policy_accepts_strong_password() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("SecurePass123").is_ok());
    }

    #[test]
    fn test_policy_rejects_weak_passwords() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("Sp1").is_err());
        assert!(policy.validate("alllowercase1").is_err());
        assert!(policy.validate("ALLUPPERCASE1").is_err());
        assert!(policy.validate("NoDigitsHere").is_err());
        assert!(policy.validate(&format!("Aa1{}", "x".repeat(100))).is_err());
    }
}
