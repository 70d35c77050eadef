//! Bearer-token verification boundary
//!
//! Token issuance lives with the identity provider; this backend only
//! verifies `Authorization: Bearer` tokens and attaches the authenticated
//! principal to the request. `issue_token` exists for tests and operational
//! tooling, not as a login flow.

pub mod middleware;

pub use middleware::jwt_auth_middleware;

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: usize,
    pub iat: usize,
}

/// The verified principal attached to each private request
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    /// Verify a bearer token and extract the principal
    pub fn verify_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Token subject is not a user id"))?;

        Ok(AuthenticatedUser { user_id })
    }

    /// Mint a token for `user_id` (tests and tooling)
    pub fn issue_token(&self, user_id: i64, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow::anyhow!("Token expiry out of range"))?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let service = AuthService::new("test-secret".into());
        let token = service.issue_token(1001, Duration::hours(1)).unwrap();

        let user = service.verify_token(&token).unwrap();
        assert_eq!(user.user_id, 1001);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = AuthService::new("secret-a".into());
        let verifier = AuthService::new("secret-b".into());

        let token = issuer.issue_token(1001, Duration::hours(1)).unwrap();
        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = AuthService::new("test-secret".into());
        let token = service.issue_token(1001, Duration::hours(-2)).unwrap();
        assert!(service.verify_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = AuthService::new("test-secret".into());
        assert!(service.verify_token("not.a.token").is_err());
    }
}
