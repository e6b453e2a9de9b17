use axum::Json;
use finshare_db::models::User;
use serde::Serialize;

use super::{id_hex, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: id_hex(user.id),
            email: user.email,
            display_name: user.display_name,
            created_at: rfc3339(user.created_at),
        }
    }
}

/// Returns the internal user for the presented identity, creating it on first contact.
pub async fn me(auth: AuthUser) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(auth.user.into()))
}
