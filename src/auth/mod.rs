pub mod extractors;
pub mod gate;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// Re-export necessary items
pub use extractors::CurrentUser;
pub use gate::{AuthGate, TokenPair};
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use token::{TokenClaims, TokenCodec, TokenError, TokenType};

/// Value of `token_type` in every token response.
pub const BEARER: &str = "Bearer";

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username for the new account.
    /// Must be between 3 and 30 characters, alphanumeric, and can include underscores or hyphens.
    #[validate(
        length(min = 3, max = 30),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    /// Plaintext password for the new account, at least 6 characters and at most
    /// 72 bytes. `password_hash` is accepted as a field name for older clients.
    #[serde(alias = "password_hash")]
    #[validate(length(min = 6), custom = "validate_password_bytes")]
    pub password: String,
}

fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > password::MAX_PASSWORD_BYTES {
        let mut error = ValidationError::new("length");
        error.message = Some("Password must be at most 72 bytes".into());
        return Err(error);
    }
    Ok(())
}

/// OAuth2 password-grant style login form (`application/x-www-form-urlencoded`).
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Tokens handed back after login or refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Only present on login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Always `"Bearer"`.
    pub token_type: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: Some(pair.refresh_token),
            token_type: BEARER.to_string(),
        }
    }
}

impl TokenResponse {
    pub fn access_only(access_token: String) -> Self {
        Self {
            access_token,
            refresh_token: None,
            token_type: BEARER.to_string(),
        }
    }
}
