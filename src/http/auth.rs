use super::state::AppState;
use crate::error::ApiError;
use crate::model::{Role, SessionIdentity, UserId};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

/// Identity behind the request's `Authorization: Bearer <token>` header
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: SessionIdentity,
    pub token: String,
}

impl AuthUser {
    pub fn is(&self, role: Role, id: UserId) -> bool {
        self.identity.user_type == role && self.identity.id == id
    }

    /// Reject unless the caller is exactly this user
    pub fn require(&self, role: Role, id: UserId) -> Result<(), ApiError> {
        if self.is(role, id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "Only {} {} may do this",
                role, id
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let directory = state.directory.read().await;
        let identity = directory.authenticate(token, Utc::now())?;

        Ok(AuthUser {
            identity,
            token: token.to_string(),
        })
    }
}
