use std::time::Duration;

use anyhow::{anyhow, bail};
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::state::AppState;
use crate::users::repo_types::UserRole;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Identity claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub iat: usize,
    pub exp: usize,
    pub kind: TokenKind,
}

/// The pair returned by login and refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signing material derived from config. Access and refresh tokens use
/// distinct secrets, so a refresh token can never pass access verification
/// even before the `kind` check.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            access_secret,
            refresh_secret,
            access_ttl_days,
            refresh_ttl_days,
        } = state.config.jwt.clone();
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl: Duration::from_secs(access_ttl_days as u64 * 24 * 60 * 60),
            refresh_ttl: Duration::from_secs(refresh_ttl_days as u64 * 24 * 60 * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
        kind: TokenKind,
    ) -> anyhow::Result<String> {
        let (key, ttl) = match kind {
            TokenKind::Access => (&self.access_encoding, self.access_ttl),
            TokenKind::Refresh => (&self.refresh_encoding, self.refresh_ttl),
        };
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            kind,
        };
        let token = encode(&Header::default(), &claims, key)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Sign an access + refresh pair from one claim set.
    pub fn generate(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign_with_kind(user_id, email, role, TokenKind::Access)?,
            refresh_token: self.sign_with_kind(user_id, email, role, TokenKind::Refresh)?,
        })
    }

    /// Signature + expiry check. Every failure cause (malformed, wrong
    /// secret, expired, wrong kind) collapses into one opaque message.
    pub fn verify_access(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.access_decoding, &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "access token rejected");
                anyhow!("Invalid or expired token")
            })?;
        if data.claims.kind != TokenKind::Access {
            bail!("Invalid or expired token");
        }
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.refresh_decoding, &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "refresh token rejected");
                anyhow!("Invalid or expired refresh token")
            })?;
        if data.claims.kind != TokenKind::Refresh {
            bail!("Invalid or expired refresh token");
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let pair = keys
            .generate(user_id, "ada@example.com", UserRole::User)
            .expect("generate pair");
        let claims = keys.verify_access(&pair.access_token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn refresh_token_passes_refresh_verification() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let pair = keys
            .generate(user_id, "ada@example.com", UserRole::Admin)
            .expect("generate pair");
        let claims = keys.verify_refresh(&pair.refresh_token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn token_kinds_are_not_interchangeable() {
        let keys = make_keys();
        let pair = keys
            .generate(Uuid::new_v4(), "ada@example.com", UserRole::User)
            .expect("generate pair");

        let err = keys.verify_access(&pair.refresh_token).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired token");

        let err = keys.verify_refresh(&pair.access_token).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired refresh token");
    }

    #[tokio::test]
    async fn tampered_token_is_rejected_with_opaque_message() {
        let keys = make_keys();
        let pair = keys
            .generate(Uuid::new_v4(), "ada@example.com", UserRole::User)
            .expect("generate pair");
        let mut tampered = pair.access_token.clone();
        tampered.pop();
        let err = keys.verify_access(&tampered).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired token");
    }

    #[tokio::test]
    async fn token_pair_serializes_camel_case() {
        let keys = make_keys();
        let pair = keys
            .generate(Uuid::new_v4(), "ada@example.com", UserRole::User)
            .expect("generate pair");
        let json = serde_json::to_value(&pair).unwrap();
        assert!(json.get("accessToken").is_some());
        assert!(json.get("refreshToken").is_some());
    }
}
