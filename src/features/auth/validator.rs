use super::model::{SessionClaims, SessionUser};
use crate::core::error::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;

/// Validates HS256 session tokens issued by the portal's auth service
pub struct SessionValidator {
    decoding_key: DecodingKey,
    leeway: u64,
    cookie_name: String,
}

impl SessionValidator {
    pub fn new(secret: &str, leeway: Duration, cookie_name: String) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway: leeway.as_secs(),
            cookie_name,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn validate_token(&self, token: &str) -> Result<SessionUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.validate_aud = false;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(format!("Invalid session token: {}", e)))?;

        let claims = token_data.claims;

        // Portal tokens carry `userId`; fall back to the standard `sub`
        let user_id = claims
            .user_id
            .or(claims.sub)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Auth("Session token has no user id".to_string()))?;

        let name = format!("{} {}", claims.first_name, claims.last_name)
            .trim()
            .to_string();

        Ok(SessionUser {
            user_id,
            email: claims.email,
            name,
            role: claims.role,
        })
    }
}
