use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, RawClaims};
use crate::state::AppState;

/// Lifetime of every issued bearer token.
pub const TOKEN_TTL: Duration = Duration::days(7);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
    #[error("token payload is missing required claims")]
    IncompleteClaims,
}

/// Signing and verification keys derived once from the server secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: TOKEN_TTL,
        }
    }

    pub fn sign(&self, user_id: Uuid, email: &str, name: &str) -> anyhow::Result<String> {
        self.sign_at(user_id, email, name, OffsetDateTime::now_utc())
    }

    pub(crate) fn sign_at(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            name: name.to_string(),
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    pub(crate) fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against `now` below: a token is dead at exactly `exp`.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<RawClaims>(token, &self.decoding, &validation)?;
        if data.claims.exp <= now.unix_timestamp() {
            return Err(TokenError::Expired);
        }
        let claims = data.claims.complete().ok_or(TokenError::IncompleteClaims)?;
        debug!(user_id = %claims.sub, "jwt verified");
        Ok(claims)
    }
}
