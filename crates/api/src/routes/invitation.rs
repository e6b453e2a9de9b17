use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use finshare_db::models::Invitation;
use finshare_services::invitation::ResponseDecision;
use serde::{Deserialize, Serialize};

use super::{id_hex, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SendInvitationRequest {
    pub invitee_email: String,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub decision: ResponseDecision,
}

#[derive(Debug, Deserialize)]
pub struct RequestAccessRequest {
    pub owner_email: String,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: String,
    pub inviter_email: String,
    pub invitee_email: String,
    pub origin: String,
    pub status: String,
    pub live: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Invitation> for InvitationResponse {
    fn from(inv: Invitation) -> Self {
        Self {
            id: id_hex(inv.id),
            origin: inv.origin.as_str().to_string(),
            status: inv.status.as_str().to_string(),
            live: inv.live,
            created_at: rfc3339(inv.created_at),
            updated_at: rfc3339(inv.updated_at),
            inviter_email: inv.inviter_email,
            invitee_email: inv.invitee_email,
        }
    }
}

pub async fn send(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SendInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), ApiError> {
    let invitation = state
        .invitations
        .send(&auth.user, &body.invitee_email)
        .await?;

    Ok((StatusCode::CREATED, Json(invitation.into())))
}

pub async fn list_sent(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InvitationResponse>>, ApiError> {
    let invitations = state.invitations.list_sent(&auth.user).await?;
    Ok(Json(invitations.into_iter().map(Into::into).collect()))
}

pub async fn list_received(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InvitationResponse>>, ApiError> {
    let invitations = state.invitations.list_received(&auth.user).await?;
    Ok(Json(invitations.into_iter().map(Into::into).collect()))
}

pub async fn respond(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invitation_id): Path<String>,
    Json(body): Json<RespondRequest>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let id = parse_id(&invitation_id, "invitation_id")?;
    let invitation = state
        .invitations
        .respond(&auth.user, id, body.decision)
        .await?;

    Ok(Json(invitation.into()))
}

pub async fn revoke(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invitation_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&invitation_id, "invitation_id")?;
    state.invitations.revoke(&auth.user, id).await?;

    Ok(Json(serde_json::json!({ "revoked": true })))
}

pub async fn remove_accepted(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invitation_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&invitation_id, "invitation_id")?;
    state.invitations.remove_accepted(&auth.user, id).await?;

    Ok(Json(serde_json::json!({ "removed": true })))
}

pub async fn request_again(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<RequestAccessRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), ApiError> {
    let invitation = state
        .invitations
        .request_access_again(&auth.user, &body.owner_email)
        .await?;

    Ok((StatusCode::CREATED, Json(invitation.into())))
}
