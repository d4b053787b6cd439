use crate::error::AppError;
use bcrypt::{hash, verify};

/// bcrypt only reads this many bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// bcrypt password hashing with a configured cost factor.
///
/// Every call to [`hash_password`](Self::hash_password) uses a fresh salt, so hashing
/// the same password twice yields two different digests that both verify.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hashes `password`. Passwords longer than [`MAX_PASSWORD_BYTES`] are refused
    /// rather than truncated.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::ValidationError(format!(
                "password: must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        hash(password, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    /// Checks `password` against a stored digest.
    ///
    /// A mismatch is `Ok(false)`, as is any password too long to have been hashed.
    /// A digest bcrypt cannot parse is an `InternalServerError`: the stored data is
    /// broken, the password is not wrong.
    pub fn verify_password(&self, password: &str, hashed_password: &str) -> Result<bool, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        verify(password, hashed_password)
            .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
    }
}
