use std::str::FromStr;

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig, state::AppState};

/// Why a token was refused. Kept for logs; clients only see "invalid token".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("expired")]
    Expired,
    #[error("bad signature")]
    BadSignature,
    #[error("malformed")]
    Malformed,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    InvalidToken(Rejection),
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token expiry is out of the representable time range")]
    ExpiryOutOfRange,
}

/// Signs and verifies bearer tokens with a symmetric secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: TimeDuration,
}

impl TokenIssuer {
    pub fn new(cfg: &JwtConfig) -> anyhow::Result<Self> {
        let algorithm = Algorithm::from_str(cfg.algorithm.trim())
            .with_context(|| format!("unknown JWT algorithm {}", cfg.algorithm))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            anyhow::bail!("JWT algorithm {:?} needs an asymmetric key; only HS256/HS384/HS512 are supported", algorithm);
        }
        if cfg.expire_minutes < 0 {
            anyhow::bail!("JWT expiry must not be negative (got {} minutes)", cfg.expire_minutes);
        }
        let ttl = cfg
            .expire_minutes
            .checked_mul(60)
            .map(TimeDuration::seconds)
            .filter(|ttl| OffsetDateTime::now_utc().checked_add(*ttl).is_some())
            .with_context(|| format!("JWT expiry of {} minutes is too large", cfg.expire_minutes))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm,
            ttl,
        })
    }

    pub fn issue(&self, subject: &str, role: &str) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = now
            .checked_add(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = Claims {
            sub: subject.to_owned(),
            role: role.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(sub = %subject, "jwt signed");
        Ok(token)
    }

    /// Verifies signature and expiry. A token whose `exp` is not strictly in the future is expired.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::InvalidSignature => Rejection::BadSignature,
                ErrorKind::ExpiredSignature => Rejection::Expired,
                _ => Rejection::Malformed,
            };
            TokenError::InvalidToken(reason)
        })?;

        let now = OffsetDateTime::now_utc().unix_timestamp();
        if (data.claims.exp as i64) <= now {
            return Err(TokenError::InvalidToken(Rejection::Expired));
        }
        debug!(sub = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
