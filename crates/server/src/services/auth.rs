//! Password hashing and access token issuance.
//!
//! Passwords are hashed with Argon2id. Access tokens are short-lived JWTs
//! signed with the server's `SECRET_KEY`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::{ACCESS_TOKEN_EXPIRE_MINUTES, TOKEN_ALGORITHM};
use crate::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 50;

/// JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username the token was issued for.
    pub sub: String,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
}

/// Check a candidate password against the length policy, returning a
/// user-facing message on failure.
///
/// # Errors
///
/// Returns `AppError::Validation` when the password is out of bounds.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns `AppError::Internal` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored Argon2 hash.
///
/// An unparseable stored hash counts as a failed verification rather than
/// an error, so a corrupted row cannot be used to log in.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Issue an access token for a username.
///
/// # Errors
///
/// Returns `AppError::Internal` if signing fails.
pub fn create_access_token(username: &str, secret_key: &SecretString) -> Result<String, AppError> {
    let claims = Claims {
        sub: username.to_owned(),
        exp: (Utc::now() + Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES)).timestamp(),
    };
    jsonwebtoken::encode(
        &Header::new(TOKEN_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret_key.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

/// Decode and validate an access token, returning its claims.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for expired, forged, or malformed
/// tokens. No detail leaks to the caller.
pub fn decode_access_token(token: &str, secret_key: &SecretString) -> Result<Claims, AppError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret_key.expose_secret().as_bytes()),
        &Validation::new(TOKEN_ALGORITHM),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("0123456789abcdef0123456789abcdef")
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("hunter42").unwrap();
        assert!(verify_password("hunter42", &hash));
        assert!(!verify_password("hunter43", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("hunter42").unwrap();
        let b = hash_password("hunter42").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_stored_hash_fails_closed() {
        assert!(!verify_password("hunter42", "not-a-phc-string"));
    }

    #[test]
    fn password_length_policy() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"x".repeat(50)).is_ok());
        assert!(validate_password(&"x".repeat(51)).is_err());
    }

    #[test]
    fn token_round_trip() {
        let token = create_access_token("anna_w", &secret()).unwrap();
        let claims = decode_access_token(&token, &secret()).unwrap();
        assert_eq!(claims.sub, "anna_w");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = create_access_token("anna_w", &secret()).unwrap();
        let other = SecretString::from("ffffffffffffffffffffffffffffffff");
        assert!(matches!(
            decode_access_token(&token, &other),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut token = create_access_token("anna_w", &secret()).unwrap();
        token.push('x');
        assert!(decode_access_token(&token, &secret()).is_err());
    }
}
