use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::{
    error::ApiError,
    state::AppState,
    users::{Role, User, UserStore},
};

/// Resolves the bearer token to a full user record. Runs before any
/// handler body, so unauthorized callers never reach handler logic.
#[derive(Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::authentication("Missing Authorization header"))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::authentication("Invalid Authorization header"))?;

        let claims = keys.verify_access(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::authentication("Invalid or expired token")
        })?;

        let user = state.users.find_by_id(claims.sub).await?.ok_or_else(|| {
            warn!(user_id = %claims.sub, "token subject not found");
            ApiError::authentication("User not found")
        })?;

        Ok(CurrentUser(user))
    }
}

/// Role gate composed at the top of role-restricted handlers. An unset
/// role never satisfies a requirement.
pub fn require_role(user: &User, required: Role) -> Result<(), ApiError> {
    if user.role == Some(required) {
        return Ok(());
    }
    let message = match required {
        Role::Engineer => "Engineer access required",
        Role::Recruiter => "Recruiter access required",
    };
    Err(ApiError::authorization(message))
}
