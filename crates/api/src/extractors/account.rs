use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::request::Parts,
};
use bson::oid::ObjectId;
use serde::Deserialize;
use tracing::{debug, warn};

use super::auth::AuthUser;
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
struct AccountQuery {
    account_id: Option<String>,
}

/// The account a request operates on: the requester's own, or the one named by
/// `?account_id=`. Extraction fails with `AccessDenied` unless the requester
/// may act on that account; it never falls back to the requester's own data.
#[derive(Debug, Clone)]
pub struct ActingAccount {
    pub requester: AuthUser,
    pub owner_id: ObjectId,
}

impl ActingAccount {
    pub fn is_own(&self) -> bool {
        self.requester.user_id == self.owner_id
    }

    /// Guards actions reserved to the account owner, such as bulk deletion.
    pub async fn require_owner(&self, state: &AppState) -> Result<(), ApiError> {
        if self.is_own() {
            return Ok(());
        }
        if state
            .access
            .is_subaccount(self.requester.user_id, self.owner_id)
            .await?
        {
            return Err(ApiError::Forbidden(
                "Only the account owner may perform this action".to_string(),
            ));
        }
        Err(ApiError::AccessDenied("No access to this account".to_string()))
    }
}

impl<S> FromRequestParts<S> for ActingAccount
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let requester = AuthUser::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);

        let Query(query) = Query::<AccountQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest("Invalid query string".to_string()))?;

        let owner_id = match query.account_id.as_deref() {
            None | Some("") => requester.user_id,
            Some(raw) => ObjectId::parse_str(raw)
                .map_err(|_| ApiError::BadRequest("Invalid account_id".to_string()))?,
        };

        if !app_state
            .access
            .has_account_access(requester.user_id, owner_id)
            .await?
        {
            warn!(requester = %requester.user_id, %owner_id, "Cross-account access denied");
            return Err(ApiError::AccessDenied("No access to this account".to_string()));
        }

        debug!(requester = %requester.user_id, %owner_id, "Acting on account");
        Ok(ActingAccount {
            requester,
            owner_id,
        })
    }
}
