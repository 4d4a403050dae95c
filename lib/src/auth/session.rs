//! Signed, time-limited session credentials.
//!
//! A session is an HS256 JWT carrying the user id, handed to the browser as
//! an HTTP-only cookie. Verification failures all collapse into a single
//! authentication error so the response never leaks why a token was bad.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_days: i64,
    /// Adds the `Secure` attribute to session cookies. Off by default so
    /// plain-HTTP development setups work; deployments behind TLS enable it.
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            token_expiry_days: 30,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The user id the session was issued for.
    pub sub: Uuid,
    pub exp: i64,
}

impl AuthConfig {
    pub fn issue_token(&self, user_id: Uuid) -> AppResult<String> {
        let exp = Utc::now() + Duration::days(self.token_expiry_days);
        let claims = SessionClaims {
            sub: user_id,
            exp: exp.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Uuid> {
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims.sub)
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    Ok(bcrypt::verify(password, hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_round_trip_session_token() {
        let cfg = AuthConfig::default();
        let user_id = Uuid::new_v4();
        let token = cfg.issue_token(user_id).unwrap();
        assert_eq!(cfg.verify_token(&token).unwrap(), user_id);
    }

    #[test]
    fn should_reject_token_signed_with_other_secret() {
        let cfg = AuthConfig::default();
        let other = AuthConfig {
            jwt_secret: "different".into(),
            ..AuthConfig::default()
        };
        let token = other.issue_token(Uuid::new_v4()).unwrap();
        let err = cfg.verify_token(&token).unwrap_err();
        assert_eq!(
            err,
            AppError::Authentication("Not authorized, token failed".into())
        );
    }

    #[test]
    fn should_verify_hashed_password() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
