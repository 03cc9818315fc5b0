use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::error::AppError;
use crate::state::AppState;

/// Extracts and validates the bearer token, yielding the user's email.
pub struct AuthUser(pub String);

/// Like [`AuthUser`], but a missing or invalid token yields `None` instead of
/// rejecting. Used by the view-tracking route, which accepts anonymous calls.
pub struct MaybeAuthUser(pub Option<String>);

fn bearer_email(parts: &Parts, keys: &JwtKeys) -> Result<String, &'static str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or("missing Authorization header")?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or("invalid auth scheme")?;

    let claims = keys.verify(token).map_err(|_| "invalid or expired token")?;
    Ok(claims.sub)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        match bearer_email(parts, &keys) {
            Ok(email) => Ok(AuthUser(email)),
            Err(reason) => {
                warn!(reason, "rejected request");
                Err(AppError::Unauthorized(reason.to_string()))
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        Ok(MaybeAuthUser(bearer_email(parts, &keys).ok()))
    }
}
