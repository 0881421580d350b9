use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = cfg.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs(
                ttl_minutes.max(1).unsigned_abs().saturating_mul(60),
            ),
        }
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now
            .checked_add(TimeDuration::seconds(i64::try_from(self.access_ttl.as_secs())?))
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?;
        let claims = Claims {
            sub: user_id,
            iat: usize::try_from(now.unix_timestamp())?,
            exp: usize::try_from(exp.unix_timestamp())?,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}
