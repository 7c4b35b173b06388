/// Password hashing using Argon2id
///
/// The engine depends on the [`PasswordEncoder`] trait, so callers can swap
/// the cost parameters (tests use cheap ones). [`Argon2Encoder::default`]
/// uses the production parameters:
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// Hashes are PHC strings carrying their own parameters, so verification
/// works regardless of which encoder produced them.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::{Argon2Encoder, PasswordEncoder};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let encoder = Argon2Encoder::default();
/// let hash = encoder.encode("super_secret_password_123")?;
///
/// assert!(encoder.matches("super_secret_password_123", &hash)?);
/// assert!(!encoder.matches("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Turns raw passwords into stored hashes and checks them
pub trait PasswordEncoder: Send + Sync {
    fn encode(&self, raw: &str) -> Result<String, PasswordError>;

    fn matches(&self, raw: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Encoder {
    /// Memory in KiB
    pub m_cost: u32,

    /// Iterations
    pub t_cost: u32,

    /// Lanes
    pub p_cost: u32,
}

impl Default for Argon2Encoder {
    fn default() -> Self {
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 4,
        }
    }
}

impl Argon2Encoder {
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Self {
        Self {
            m_cost,
            t_cost,
            p_cost,
        }
    }
}

impl PasswordEncoder for Argon2Encoder {
    fn encode(&self, raw: &str) -> Result<String, PasswordError> {
        hash_password_with(raw, self)
    }

    fn matches(&self, raw: &str, hash: &str) -> Result<bool, PasswordError> {
        verify_password(raw, hash)
    }
}

/// Hashes a password with the production parameters
///
/// Example output:
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with(password, &Argon2Encoder::default())
}

fn hash_password_with(password: &str, cost: &Argon2Encoder) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(cost.m_cost)
        .t_cost(cost.t_cost)
        .p_cost(cost.p_cost)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC hash in constant time
///
/// # Returns
///
/// `Ok(true)` if password matches, `Ok(false)` if it doesn't match
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be parsed
/// or lacks a salt or output
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;
    if parsed_hash.salt.is_none() || parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHash(
            "Hash is missing its salt or output".to_string(),
        ));
    }

    // Parameters come from the hash itself
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}
