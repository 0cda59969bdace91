//! JWT authentication middleware.
//!
//! Validates bearer tokens and exposes the caller as an [`AuthUser`]
//! request extension.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::UserRole;
use crate::services::Actor;
use crate::state::AppState;
use crate::utils::jwt::{Claims, validate_access_token};

/// Extension type for authenticated user information
///
/// Extract in handlers with `Extension<AuthUser>`, or
/// `Option<Extension<AuthUser>>` behind [`optional_auth_middleware`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Administrator role required"))
        }
    }

    /// Notification scope of this caller: admins see every inbox
    pub fn scope(&self) -> Option<i32> {
        (!self.is_admin()).then_some(self.user_id)
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id,
            name: self.username.clone(),
        }
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> AppResult<Self> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email,
            username: claims.username,
            role: claims.role,
        })
    }
}

fn bearer_token(request: &Request) -> AppResult<&str> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing authorization header".to_string(),
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid authorization header format. Expected: Bearer <token>".to_string(),
        })
}

/// JWT authentication middleware
///
/// # Errors
/// 401 Unauthorized when the header is missing or malformed, or the token
/// is invalid, expired or not an access token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = validate_access_token(bearer_token(&request)?, &state.jwt_config.secret)?;
    let auth_user = AuthUser::try_from(claims)?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Like [`auth_middleware`], but anonymous requests pass through.
///
/// A token that is present but invalid is still rejected, so clients
/// notice expired sessions instead of silently acting anonymously.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.headers().contains_key(header::AUTHORIZATION) {
        let claims = validate_access_token(bearer_token(&request)?, &state.jwt_config.secret)?;
        let auth_user = AuthUser::try_from(claims)?;
        request.extensions_mut().insert(auth_user);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::TokenType;

    fn claims(sub: &str, role: UserRole) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: "test@example.com".to_string(),
            username: "testuser".to_string(),
            role,
            token_type: TokenType::Access,
            iat: 0,
            exp: 9999999999,
        }
    }

    #[test]
    fn test_auth_user_from_claims() {
        let auth_user = AuthUser::try_from(claims("123", UserRole::User)).unwrap();
        assert_eq!(auth_user.user_id, 123);
        assert_eq!(auth_user.scope(), Some(123));
        assert!(auth_user.require_admin().is_err());
        assert_eq!(auth_user.actor().name, "testuser");
    }

    #[test]
    fn test_admin_scope_covers_everything() {
        let admin = AuthUser::try_from(claims("1", UserRole::Admin)).unwrap();
        assert_eq!(admin.scope(), None);
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_invalid_subject_is_rejected() {
        assert!(matches!(
            AuthUser::try_from(claims("invalid", UserRole::User)),
            Err(AppError::Unauthorized { .. })
        ));
    }
}
