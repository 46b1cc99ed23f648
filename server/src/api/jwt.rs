use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestUser;

use super::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id (UUID, stored as string in JWT)
    pub sub: Uuid,
    pub login: String,
    pub org_id: i64,
    #[serde(default)]
    pub is_server_admin: bool,
    /// Unix timestamp expiry
    pub exp: u64,
}

impl From<Claims> for RequestUser {
    fn from(claims: Claims) -> Self {
        RequestUser::signed_in(claims.sub, claims.login, claims.org_id)
            .with_server_admin(claims.is_server_admin)
    }
}

pub fn encode_jwt(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

fn extract_bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Extractor: the caller's identity. A valid Bearer token gives a signed-in
/// user; no token gives an anonymous caller in the anonymous org, or in org 0
/// when anonymous access is off. A bad token is rejected.
pub struct CurrentUser(pub RequestUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let Some(token) = extract_bearer(parts) else {
            let config = state.assembler.config();
            let org_id = if config.anonymous_enabled {
                config.anonymous_org_id
            } else {
                0
            };
            return Ok(CurrentUser(RequestUser::anonymous(org_id)));
        };

        let claims = decode_jwt(token, &state.jwt_secret)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;

        Ok(CurrentUser(claims.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: u64) -> Claims {
        Claims {
            sub: Uuid::now_v7(),
            login: "alice".to_string(),
            org_id: 3,
            is_server_admin: true,
            exp,
        }
    }

    #[test]
    fn token_round_trip_into_user() {
        let exp = chrono::Utc::now().timestamp() as u64 + 3600;
        let original = claims(exp);
        let token = encode_jwt(&original, "secret").unwrap();

        let user: RequestUser = decode_jwt(&token, "secret").unwrap().into();
        assert_eq!(user.user_id, Some(original.sub));
        assert_eq!(user.org_id, 3);
        assert!(user.is_signed_in);
        assert!(user.is_server_admin);
    }

    #[test]
    fn wrong_secret_and_expired_tokens_fail() {
        let exp = chrono::Utc::now().timestamp() as u64 + 3600;
        let token = encode_jwt(&claims(exp), "secret").unwrap();
        assert!(decode_jwt(&token, "other").is_err());

        let expired = encode_jwt(&claims(1), "secret").unwrap();
        assert!(decode_jwt(&expired, "secret").is_err());
    }
}
