//! Authentication middleware
//!
//! JWT authentication and role-based access control middleware. Tokens are
//! issued elsewhere; this module only verifies them and resolves the
//! bearer's permissions from their designation and role.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::Actor;
use crate::AppState;
use shared::{permission_keys, Action, Designation, Resource, Role};

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub designation: Designation,
    pub role: Option<Role>,
    /// Flattened `resource:action` keys
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn new(user_id: impl Into<String>, designation: Designation, role: Option<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            designation,
            role,
            permissions: permission_keys(designation, role),
        }
    }

    /// Check if user has a specific permission
    pub fn has_permission(&self, resource: Resource, action: Action) -> bool {
        let permission = format!("{}:{}", resource.as_str(), action.as_str());
        self.permissions.contains(&permission)
    }
}

impl From<&AuthUser> for Actor {
    fn from(user: &AuthUser) -> Self {
        Actor::new(user.user_id.clone())
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub designation: Designation,
    /// Role display name, e.g. "Senior Officer"
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication middleware that validates bearer tokens against the
/// configured secret and stores the `AuthUser` in request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;

    let claims = decode_jwt(token, &state.config.jwt.secret)?;

    let role = match claims.role.as_deref() {
        Some(name) => Some(
            Role::from_str(name)
                .ok_or_else(|| AppError::Unauthorized(format!("Unknown role: {}", name)))?,
        ),
        None => None,
    };

    let auth_user = AuthUser::new(claims.sub, claims.designation, role);
    tracing::debug!(
        user_id = %auth_user.user_id,
        designation = %auth_user.designation,
        "request authenticated"
    );

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

/// Sign a token for a user. Used by tests and operator tooling.
pub fn issue_token(
    secret: &str,
    user_id: &str,
    designation: Designation,
    role: Option<Role>,
    ttl_secs: i64,
) -> AppResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        designation,
        role: role.map(|r| r.as_str().to_string()),
        exp: now + ttl_secs,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token signing error: {}", e)))
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Permission guard for use in handlers
pub fn check_permission(user: &AuthUser, resource: Resource, action: Action) -> AppResult<()> {
    if user.has_permission(resource, action) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %user.user_id,
            required = %format!("{}:{}", resource.as_str(), action.as_str()),
            "permission denied"
        );
        Err(AppError::InsufficientPermissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_designation_holds_every_permission() {
        let user = AuthUser::new("admin", Designation::Admin, None);
        assert!(user.has_permission(Resource::Qc, Action::Delete));
        assert!(user.has_permission(Resource::User, Action::Manage));
    }

    #[test]
    fn role_drives_permissions_for_other_designations() {
        let user = AuthUser::new("u1", Designation::Qc, Some(Role::JuniorOfficer));
        assert!(check_permission(&user, Resource::Qc, Action::View).is_ok());
        assert!(matches!(
            check_permission(&user, Resource::Qc, Action::Add),
            Err(AppError::InsufficientPermissions)
        ));
    }

    #[test]
    fn issued_tokens_decode_with_the_same_secret() {
        let token = issue_token("s3cret", "qc.officer", Designation::Qc, Some(Role::QcOfficer), 60)
            .unwrap();
        let claims = decode_jwt(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, "qc.officer");
        assert_eq!(claims.role.as_deref(), Some(Role::QcOfficer.as_str()));
        assert!(matches!(decode_jwt(&token, "other"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue_token("s3cret", "qc.officer", Designation::Qc, None, -3600).unwrap();
        assert!(matches!(decode_jwt(&token, "s3cret"), Err(AppError::TokenExpired)));
    }
}
