//! JWT access tokens and link-invitation tokens.
//!
//! Both are HS256-signed with the same secret. Access tokens carry
//! [`Claims`]; invitation tokens carry [`InvitationClaims`] and are tagged
//! with a `purpose` so one can never be used in place of the other.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tourdesk_core::link::INVITATION_TTL_HOURS;
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;
use uuid::Uuid;

/// `purpose` value of every invitation token.
pub const INVITATION_PURPOSE: &str = "link-invite";

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the account's internal database id.
    pub sub: DbId,
    /// The account's role name (`"guardian"`, `"minor"` or `"staff"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

/// Claims of a link invitation sent to someone without an account.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InvitationClaims {
    pub inviter_id: DbId,
    pub inviter_role: Role,
    /// Normalized email the invitation was sent to.
    pub email: String,
    pub purpose: String,
    pub exp: i64,
    pub iat: i64,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 60).
    pub access_token_expiry_mins: i64,
    /// Invitation token lifetime in hours (default: 24).
    pub invitation_expiry_hours: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `60`    |
    /// | `INVITATION_EXPIRY_HOURS`  | no       | `24`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let invitation_expiry_hours: i64 = std::env::var("INVITATION_EXPIRY_HOURS")
            .unwrap_or_else(|_| INVITATION_TTL_HOURS.to_string())
            .parse()
            .expect("INVITATION_EXPIRY_HOURS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            invitation_expiry_hours,
        }
    }
}

/// Generate an HS256 access token for the given account.
pub fn generate_access_token(
    user_id: DbId,
    role: Role,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.as_str().to_string(),
        exp: now + config.access_token_expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Sign an invitation from `inviter_id` to `email`.
pub fn generate_invitation_token(
    inviter_id: DbId,
    inviter_role: Role,
    email: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = InvitationClaims {
        inviter_id,
        inviter_role,
        email: email.to_string(),
        purpose: INVITATION_PURPOSE.to_string(),
        exp: now + config.invitation_expiry_hours * 3600,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate an invitation token. Tokens with any other `purpose` fail with
/// `InvalidToken`.
pub fn validate_invitation_token(
    token: &str,
    config: &JwtConfig,
) -> Result<InvitationClaims, jsonwebtoken::errors::Error> {
    let claims = decode::<InvitationClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?
    .claims;

    if claims.purpose != INVITATION_PURPOSE {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(claims)
}

/// Short SHA-256 fingerprint of a token, safe to write to logs.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{digest:x}")[..12].to_string()
}
