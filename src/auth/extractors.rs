use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{claims::Role, jwt::JwtKeys};
use crate::error::ApiError;

/// Identity decoded from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub login: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Self-service check: admins may act on anyone, others only on their own login.
    pub fn may_act_on(&self, login: &str) -> bool {
        self.is_admin() || self.login == login
    }
}

/// Any authenticated caller.
pub struct AuthUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Unauthorized
        })?;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser(Principal {
            id,
            login: claims.name,
            role: claims.role,
        }))
    }
}

/// Authenticated caller holding the `Admin` role; others get 403.
pub struct AdminUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            warn!(user_id = %principal.id, login = %principal.login, "admin role required");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(login: &str, role: Role) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            login: login.into(),
            role,
        }
    }

    #[test]
    fn users_may_only_act_on_themselves() {
        let bob = principal("bob123", Role::User);
        assert!(bob.may_act_on("bob123"));
        assert!(!bob.may_act_on("other"));
    }

    #[test]
    fn admins_may_act_on_anyone() {
        let admin = principal("Admin", Role::Admin);
        assert!(admin.may_act_on("bob123"));
        assert!(admin.may_act_on("Admin"));
    }
}
