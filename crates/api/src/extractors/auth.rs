use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use bson::oid::ObjectId;
use finshare_db::models::User;
use finshare_services::{
    auth::Claims,
    email::{is_valid_email, normalize_email},
};

use crate::{error::ApiError, state::AppState};

/// The authenticated requester, resolved to an internal user on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub user: User,
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // Try Authorization header first
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|s| s.to_string())
            // Then try cookie
            .or_else(|| {
                parts
                    .headers
                    .get(header::COOKIE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|cookies| {
                        cookies.split(';').find_map(|cookie| {
                            cookie
                                .trim()
                                .strip_prefix("access_token=")
                                .map(|s| s.to_string())
                        })
                    })
            })
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

        let claims = app_state.auth.verify_token(&token)?;

        // The email doubles as the invitation address.
        if !is_valid_email(&normalize_email(&claims.email)) {
            return Err(ApiError::Unauthorized(
                "Identity token carries no valid email".to_string(),
            ));
        }

        let display_name = if claims.name.is_empty() {
            claims.email.as_str()
        } else {
            claims.name.as_str()
        };
        let user = app_state
            .users
            .resolve(&claims.sub, &claims.email, display_name)
            .await?;

        let user_id = user
            .id
            .ok_or_else(|| ApiError::Internal("Resolved user has no id".to_string()))?;

        Ok(AuthUser {
            user_id,
            user,
            claims,
        })
    }
}
