use axum::{
    Json,
    extract::{Path, State},
};
use finshare_db::models::User;
use serde::Serialize;

use super::{id_hex, parse_id};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub is_own: bool,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub owner_id: String,
    pub has_access: bool,
    pub is_subaccount: bool,
}

fn to_response(user: User, is_own: bool) -> AccountResponse {
    AccountResponse {
        id: id_hex(user.id),
        email: user.email,
        display_name: user.display_name,
        is_own,
    }
}

/// Own account plus every account shared with the requester.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let accounts = state.access.list_accessible_accounts(&auth.user).await?;

    Ok(Json(
        accounts
            .into_iter()
            .map(|a| to_response(a.user, a.is_own))
            .collect(),
    ))
}

/// Users the requester has shared their own account with.
pub async fn delegates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let delegates = state.access.list_delegates(auth.user_id).await?;

    Ok(Json(
        delegates
            .into_iter()
            .map(|u| to_response(u, false))
            .collect(),
    ))
}

pub async fn access(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(owner_id): Path<String>,
) -> Result<Json<AccessResponse>, ApiError> {
    let oid = parse_id(&owner_id, "owner_id")?;

    let has_access = state.access.has_account_access(auth.user_id, oid).await?;
    let is_subaccount = state.access.is_subaccount(auth.user_id, oid).await?;

    Ok(Json(AccessResponse {
        owner_id: oid.to_hex(),
        has_access,
        is_subaccount,
    }))
}

pub async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(owner_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let oid = parse_id(&owner_id, "owner_id")?;
    state.invitations.leave(&auth.user, oid).await?;

    Ok(Json(serde_json::json!({ "left": true })))
}
