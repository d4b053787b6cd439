//! Signed bearer tokens.
//!
//! Tokens are compact JWS strings (`header.payload.signature`) signed with a shared
//! HMAC secret. The payload carries the caller's claims plus two fields added here:
//!
//! * `type` - either `"access"` or `"refresh"`
//! * `expire` - the expiry instant in UTC, formatted as `YYYY-MM-DD HH:MM:SS`
//!
//! Expiry is checked against `expire` rather than the registered `exp` claim, so the
//! library's own time validation is switched off. One secret signs both token types;
//! the `type` claim is what tells them apart, and it is covered by the signature.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::AuthSettings;
use crate::error::AppError;

pub const TOKEN_TYPE_FIELD: &str = "type";
pub const EXPIRE_FIELD: &str = "expire";
pub const SUBJECT_FIELD: &str = "user_id";
pub const EXPIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Claim map handed to the codec and returned from verification.
pub type ClaimMap = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenType::Access),
            "refresh" => Ok(TokenType::Refresh),
            other => Err(TokenError::UnknownTokenType(other.to_string())),
        }
    }
}

/// Why a token was rejected. Only ever logged; clients see a single 401.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token could not be decoded or its signature is invalid: {0}")]
    InvalidSignature(String),
    #[error("token has expired")]
    Expired,
    #[error("token does not carry a valid `user_id` claim")]
    MalformedToken,
    #[error("expected a {expected} token, got {found:?}")]
    WrongTokenType {
        expected: TokenType,
        found: Option<String>,
    },
    #[error("unknown token type {0:?}")]
    UnknownTokenType(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// The verified contents of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub user_id: i32,
    /// `None` when the `type` claim is absent or not a known tag.
    pub token_type: Option<TokenType>,
    pub expires_at: DateTime<Utc>,
    /// Every claim in the payload, including `type` and `expire`.
    pub claims: ClaimMap,
}

/// Issues and verifies tokens with one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret_key.as_bytes()),
            algorithm: settings.algorithm,
            access_ttl: settings.access_token_ttl,
            refresh_ttl: settings.refresh_token_ttl,
        }
    }

    pub fn default_ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }

    /// Signs `claims` as a token of `token_type` that expires after `ttl`
    /// (or the type's default lifetime).
    ///
    /// `type` and `expire` entries already present in `claims` are overwritten.
    pub fn issue(
        &self,
        token_type: TokenType,
        claims: ClaimMap,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.issue_at(token_type, claims, ttl, Utc::now())
    }

    pub fn issue_access_token(&self, claims: ClaimMap) -> Result<String, TokenError> {
        self.issue(TokenType::Access, claims, None)
    }

    pub fn issue_refresh_token(&self, claims: ClaimMap) -> Result<String, TokenError> {
        self.issue(TokenType::Refresh, claims, None)
    }

    fn issue_at(
        &self,
        token_type: TokenType,
        mut claims: ClaimMap,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = ttl.unwrap_or_else(|| self.default_ttl(token_type));
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing("expiry is out of range".into()))?;

        claims.insert(TOKEN_TYPE_FIELD.into(), Value::from(token_type.as_str()));
        claims.insert(
            EXPIRE_FIELD.into(),
            Value::from(expires_at.format(EXPIRE_FORMAT).to_string()),
        );

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies `token` and returns its claims.
    ///
    /// Checks run in a fixed order: signature, expiry, subject, then type (only
    /// when `expected` is given). The first failure is returned.
    pub fn verify(
        &self,
        token: &str,
        expected: Option<TokenType>,
    ) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, expected, Utc::now())
    }

    /// [`verify`](Self::verify) with every failure turned into `Unauthorized`.
    pub fn verify_bearer(
        &self,
        token: &str,
        required: Option<TokenType>,
    ) -> Result<TokenClaims, AppError> {
        Ok(self.verify(token, required)?)
    }

    fn verify_at(
        &self,
        token: &str,
        expected: Option<TokenType>,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        let claims = decode::<ClaimMap>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| TokenError::InvalidSignature(format!("{:?}", e.kind())))?;

        let expires_at = claims
            .get(EXPIRE_FIELD)
            .and_then(Value::as_str)
            .and_then(|raw| NaiveDateTime::parse_from_str(raw, EXPIRE_FORMAT).ok())
            .map(|naive| naive.and_utc())
            .ok_or(TokenError::Expired)?;
        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        let user_id = subject_id(&claims).ok_or(TokenError::MalformedToken)?;

        let raw_type = claims.get(TOKEN_TYPE_FIELD).and_then(Value::as_str);
        let token_type = raw_type.and_then(|raw| raw.parse::<TokenType>().ok());
        if let Some(expected) = expected {
            if token_type != Some(expected) {
                return Err(TokenError::WrongTokenType {
                    expected,
                    found: raw_type.map(str::to_string),
                });
            }
        }

        Ok(TokenClaims {
            user_id,
            token_type,
            expires_at,
            claims,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation
    }
}

/// `user_id` may be a JSON integer or a numeric string.
fn subject_id(claims: &ClaimMap) -> Option<i32> {
    match claims.get(SUBJECT_FIELD)? {
        Value::Number(number) => number.as_i64().and_then(|id| i32::try_from(id).ok()),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}
