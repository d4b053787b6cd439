//! The authentication gate.
//!
//! Every protected operation goes through [`AuthGate`]: logins are checked with
//! [`AuthGate::authenticate_credentials`] and bearer tokens are turned into an
//! [`AuthenticatedUser`] by [`AuthGate::resolve_from_bearer_token`]. Both collapse
//! their failure causes into a single `Unauthorized` so a client cannot tell an
//! unknown username from a wrong password, or an expired token from a forged one.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::OnceCell;

use super::password::PasswordHasher;
use super::token::{ClaimMap, TokenCodec, TokenType, SUBJECT_FIELD};
use crate::db::UserRepository;
use crate::error::{AppError, INVALID_TOKEN_MESSAGE};
use crate::models::{AuthenticatedUser, User};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

// Verified against when the username is unknown, so both rejections cost a bcrypt round.
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-users";

/// Access and refresh token issued together at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthGate {
    users: Arc<dyn UserRepository>,
    codec: TokenCodec,
    hasher: PasswordHasher,
    dummy_digest: OnceCell<String>,
}

impl AuthGate {
    pub fn new(users: Arc<dyn UserRepository>, codec: TokenCodec, hasher: PasswordHasher) -> Self {
        Self {
            users,
            codec,
            hasher,
            dummy_digest: OnceCell::new(),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Creates an account. The username must not be taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AppError> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AppError::BadRequest("Username already registered".into()));
        }

        let hasher = self.hasher;
        let password = password.to_owned();
        let password_hash =
            run_blocking(move || hasher.hash_password(&password)).await?;

        let user = self.users.create(username, &password_hash).await?;
        log::info!("registered user {} (id {})", user.username, user.id);
        Ok(user)
    }

    /// Checks a username/password pair.
    ///
    /// Unknown users and wrong passwords produce the same error. A stored digest
    /// bcrypt cannot read is a server fault and surfaces as such.
    pub async fn authenticate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => {
                let digest = self.unknown_user_digest().await?.to_owned();
                let hasher = self.hasher;
                let password = password.to_owned();
                run_blocking(move || hasher.verify_password(&password, &digest)).await?;
                log::info!("login rejected: no user named {:?}", username);
                return Err(invalid_credentials());
            }
        };

        let hasher = self.hasher;
        let password = password.to_owned();
        let digest = user.password_hash.clone();
        let matches = run_blocking(move || hasher.verify_password(&password, &digest)).await?;

        if !matches {
            log::info!("login rejected: wrong password for user id {}", user.id);
            return Err(invalid_credentials());
        }
        Ok(user)
    }

    /// Digest of a fixed password at the configured cost, built on first use.
    async fn unknown_user_digest(&self) -> Result<&str, AppError> {
        let hasher = self.hasher;
        let digest = self
            .dummy_digest
            .get_or_try_init(move || run_blocking(move || hasher.hash_password(DUMMY_PASSWORD)))
            .await?;
        Ok(digest.as_str())
    }

    /// Verifies `token` and loads the user it refers to.
    ///
    /// `required` pins the token type; `None` accepts either type.
    pub async fn resolve_from_bearer_token(
        &self,
        token: &str,
        required: Option<TokenType>,
    ) -> Result<AuthenticatedUser, AppError> {
        let claims = self.codec.verify_bearer(token, required)?;

        match self.users.find_by_id(claims.user_id).await? {
            Some(user) => Ok(user.into()),
            None => {
                log::warn!(
                    "rejected bearer token: user id {} no longer exists",
                    claims.user_id
                );
                Err(AppError::Unauthorized(INVALID_TOKEN_MESSAGE.into()))
            }
        }
    }

    /// Issues a fresh access/refresh pair for `user`.
    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair, AppError> {
        let claims = identity_claims(user.id, &user.username);
        Ok(TokenPair {
            access_token: self.codec.issue_access_token(claims.clone())?,
            refresh_token: self.codec.issue_refresh_token(claims)?,
        })
    }

    /// Issues a new access token for a user already resolved from a refresh token.
    pub fn refresh_access_token(&self, user: &AuthenticatedUser) -> Result<String, AppError> {
        Ok(self
            .codec
            .issue_access_token(identity_claims(user.id, &user.username))?)
    }
}

/// Claims embedded in every issued token. The password digest is never included.
fn identity_claims(user_id: i32, username: &str) -> ClaimMap {
    let mut claims = ClaimMap::new();
    claims.insert(SUBJECT_FIELD.into(), json!(user_id));
    claims.insert("username".into(), json!(username));
    claims
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.into())
}

/// Runs bcrypt work off the async executor.
async fn run_blocking<F, T>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password task failed: {}", e)))?
}
