use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::UserRole;
use crate::services::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String,    // user_id
    pub role: UserRole, // student, teacher, parent
    pub exp: usize,     // expiration timestamp
    pub iat: usize,     // issued at timestamp
}

impl JwtClaims {
    pub fn is_user(&self, user_id: &str) -> bool {
        self.sub == user_id
    }

    pub fn can_view(&self, user_id: &str) -> bool {
        self.is_user(user_id) || self.role.can_view_others()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    ExpiredToken,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Failed to sign token")]
    Signing,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl JwtService {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn issue(&self, user_id: &str, role: UserRole) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            role,
            exp: (now + self.ttl_seconds).max(0) as usize,
            iat: now.max(0) as usize,
        };
        self.generate_token(&claims)
    }

    pub fn generate_token(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(|_| AuthError::Signing)
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::InvalidToken,
            })
    }
}

/// Requires a valid bearer token and stores its claims in request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return AppError::unauthorized("Missing authorization token").into_response();
    };

    let claims = match state.jwt.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("JWT validation failed: {}", e);
            return AppError::unauthorized(e.to_string()).into_response();
        }
    };

    tracing::debug!(
        "Authenticated user: {} (role: {})",
        claims.sub,
        claims.role.as_str()
    );

    request.extensions_mut().insert(claims);
    next.run(request).await
}

/// Must run after [`auth_middleware`].
pub async fn teacher_guard_middleware(request: Request, next: Next) -> Response {
    let is_teacher = request
        .extensions()
        .get::<JwtClaims>()
        .is_some_and(|claims| claims.role == UserRole::Teacher);

    if !is_teacher {
        tracing::warn!("Access denied: teacher role required");
        return AppError::forbidden("Teacher role required").into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = JwtService::new("test-secret", 3600);

        let token = service.issue("user123", UserRole::Parent).unwrap();
        let validated = service.validate_token(&token).unwrap();

        assert_eq!(validated.sub, "user123");
        assert_eq!(validated.role, UserRole::Parent);
        assert!(validated.exp > validated.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("secret-a", 3600);
        let verifier = JwtService::new("secret-b", 3600);

        let token = issuer.issue("user123", UserRole::Student).unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // default validation leeway is 60s
        let service = JwtService::new("test-secret", -3600);
        let token = service.issue("user123", UserRole::Student).unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn teachers_and_parents_can_view_others() {
        let claims = |role| JwtClaims {
            sub: "me".to_string(),
            role,
            exp: 0,
            iat: 0,
        };
        assert!(claims(UserRole::Student).can_view("me"));
        assert!(!claims(UserRole::Student).can_view("someone-else"));
        assert!(claims(UserRole::Teacher).can_view("someone-else"));
        assert!(claims(UserRole::Parent).can_view("someone-else"));
    }
}
