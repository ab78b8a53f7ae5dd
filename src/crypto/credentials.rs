//! Pluggable credential verification.
//!
//! Login and user creation only ever talk to [`CredentialScheme`]; which
//! scheme is active is a configuration choice.

use argon2::{
    Argon2, ParamsBuilder,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::{AppError, Result};

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 1;

/// Checks supplied credentials against stored ones and produces the stored
/// form of new credentials.
pub trait CredentialScheme: Send + Sync {
    /// Whether `supplied` matches the `stored` credential.
    fn verify(&self, stored: &str, supplied: &str) -> bool;

    /// The form in which a new credential is stored.
    fn protect(&self, plain: &str) -> Result<String>;
}

/// Stores credentials as given and compares them for equality.
///
/// Comparison runs in constant time for equal-length inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCredentials;

impl CredentialScheme for PlainCredentials {
    fn verify(&self, stored: &str, supplied: &str) -> bool {
        stored.as_bytes().ct_eq(supplied.as_bytes()).into()
    }

    fn protect(&self, plain: &str) -> Result<String> {
        Ok(plain.to_string())
    }
}

/// Stores Argon2id PHC strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Credentials;

impl Argon2Credentials {
    fn hasher() -> Result<Argon2<'static>> {
        let params = ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?;

        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }
}

impl CredentialScheme for Argon2Credentials {
    fn verify(&self, stored: &str, supplied: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!("❌ Stored credential is not a PHC string: {}", e);
                return false;
            }
        };

        let mut password_bytes = supplied.as_bytes().to_vec();
        let result = Argon2::default()
            .verify_password(&password_bytes, &parsed_hash)
            .is_ok();

        password_bytes.zeroize();
        tracing::debug!("Password verification completed");
        result
    }

    fn protect(&self, plain: &str) -> Result<String> {
        let mut password_bytes = plain.as_bytes().to_vec();

        let mut salt_bytes = [0u8; 16];
        OsRng.fill_bytes(&mut salt_bytes);

        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

        let password_hash = Self::hasher()?
            .hash_password(&password_bytes, &salt)
            .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
            .to_string();

        password_bytes.zeroize();
        tracing::debug!("Password hashed successfully with Argon2");
        Ok(password_hash)
    }
}
