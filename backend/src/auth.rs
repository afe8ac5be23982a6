//! Bearer-token authentication middleware.
//!
//! The audit endpoints sit behind JWT verification; the core validators
//! only ever run for an authenticated principal. Token issuance is the
//! responsibility of the central auth service, not this API.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::rest::{AppState, RequestContext};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: usize,
}

/// The principal attached to a request once its token checks out.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl AuthenticatedUser {
    /// Check one endpoint permission. The `admin` role holds every
    /// permission implicitly.
    pub fn authorize(&self, permission: &str) -> Result<(), ApiError> {
        if self.role == "admin" || self.permissions.iter().any(|p| p == permission) {
            Ok(())
        } else {
            Err(ApiError::InsufficientPermissions)
        }
    }
}

/// Verify an `Authorization: Bearer TOKEN` header value.
pub fn verify_bearer(header: Option<&str>, secret: &str) -> Result<AuthenticatedUser, ApiError> {
    let header = header.ok_or(ApiError::MissingToken)?;

    let mut parts = header.split(' ');
    let token = match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => token,
        _ => return Err(ApiError::InvalidTokenFormat),
    };

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => ApiError::TokenExpired,
        _ => ApiError::InvalidToken,
    })?
    .claims;

    Ok(AuthenticatedUser {
        id: claims.id,
        username: claims.username,
        role: claims.role,
        permissions: claims.permissions,
    })
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();

    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match verify_bearer(header, &state.config.jwt_secret) {
        Ok(user) => {
            info!(
                username = %user.username,
                client_ip = %ctx.client_ip,
                request_id = %ctx.request_id,
                "authenticated"
            );
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            warn!(
                code = err.code(),
                client_ip = %ctx.client_ip,
                request_id = %ctx.request_id,
                "authentication failed"
            );
            err.into_envelope(&ctx.request_id, state.config.environment.is_production())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-test-secret-test-secret";

    fn token(exp_offset_secs: i64) -> String {
        let claims = Claims {
            id: "u-1".to_string(),
            username: "auditor".to_string(),
            role: "supervisor".to_string(),
            permissions: vec!["financial:read".to_string()],
            exp: (Utc::now().timestamp() + exp_offset_secs) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_a_valid_bearer_token() {
        let header = format!("Bearer {}", token(3600));
        let user = verify_bearer(Some(&header), SECRET).unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.username, "auditor");
        assert_eq!(user.role, "supervisor");
        assert_eq!(user.permissions, vec!["financial:read".to_string()]);
    }

    #[test]
    fn missing_header_is_missing_token() {
        let err = verify_bearer(None, SECRET).unwrap_err();
        assert_eq!(err.code(), "MISSING_TOKEN");
    }

    #[test]
    fn malformed_header_is_a_format_error() {
        for header in ["Token abc", "Bearer", "Bearer a b", "bearer abc"] {
            let err = verify_bearer(Some(header), SECRET).unwrap_err();
            assert_eq!(err.code(), "INVALID_TOKEN_FORMAT", "header: {header}");
        }
    }

    #[test]
    fn expired_token_is_distinguished() {
        // Past the default validation leeway.
        let header = format!("Bearer {}", token(-3600));
        let err = verify_bearer(Some(&header), SECRET).unwrap_err();
        assert_eq!(err.code(), "TOKEN_EXPIRED");
    }

    #[test]
    fn authorize_requires_the_named_permission() {
        let user = AuthenticatedUser {
            id: "u-1".to_string(),
            username: "auditor".to_string(),
            role: "supervisor".to_string(),
            permissions: vec!["read:transactions".to_string()],
        };
        assert!(user.authorize("read:transactions").is_ok());

        let err = user.authorize("read:closures").unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PERMISSIONS");
    }

    #[test]
    fn admin_role_bypasses_permission_checks() {
        let admin = AuthenticatedUser {
            id: "u-2".to_string(),
            username: "root".to_string(),
            role: "admin".to_string(),
            permissions: vec![],
        };
        assert!(admin.authorize("read:summary").is_ok());
        assert!(admin.authorize("read:adjustments").is_ok());
    }

    #[test]
    fn wrong_secret_is_an_invalid_token() {
        let header = format!("Bearer {}", token(3600));
        let err = verify_bearer(Some(&header), "another-secret-entirely").unwrap_err();
        assert_eq!(err.code(), "INVALID_TOKEN");
    }
}
