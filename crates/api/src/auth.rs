//! Bearer-token authentication: claims, signing, and the request
//! extractors guarding user and admin routes.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use common::UserId;
use domain::Mailer;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use store::{Store, User};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by every bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Expiration time, seconds since the epoch.
    pub exp: usize,
}

/// Signs a token for the user.
pub fn issue_token(user_id: UserId, secret: &str, ttl_hours: i64) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.as_uuid(),
        exp,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("please authenticate".to_string()))
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

async fn resolve_user<S: Store, M: Mailer + 'static>(
    parts: &Parts,
    state: &AppState<S, M>,
) -> Result<User, ApiError> {
    let token = bearer_token(parts)
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))?;
    let claims = decode_token(token, &state.config.jwt_secret)?;
    state
        .store
        .get_user(UserId::from_uuid(claims.sub))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::Unauthorized("please authenticate".to_string()))
}

/// Extracts the authenticated user from the bearer token.
pub struct AuthUser(pub User);

impl<S: Store, M: Mailer + 'static> FromRequestParts<Arc<AppState<S, M>>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S, M>>,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthUser(resolve_user(parts, state).await?))
    }
}

/// Extracts the authenticated user and requires the admin role.
pub struct AdminUser(pub User);

impl<S: Store, M: Mailer + 'static> FromRequestParts<Arc<AppState<S, M>>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S, M>>,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden("admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_decode_with_the_same_secret() {
        let user_id = UserId::new();
        let token = issue_token(user_id, "secret", 24).unwrap();

        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user_id.as_uuid());

        assert!(decode_token(&token, "other-secret").is_err());
        assert!(decode_token("garbage", "secret").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue_token(UserId::new(), "secret", -1).unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }
}
