//! Invitation workflow: the only writer of invitations and access grants.
//!
//! Every transition is validated against current state before it mutates
//! anything, and transitions touching both collections run in one
//! transaction so an accepted invitation and its grant appear and disappear
//! together.

use bson::oid::ObjectId;
use finshare_db::models::{Invitation, InvitationOrigin, InvitationStatus, User};
use futures::FutureExt;
use mongodb::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::dao::{
    access_grant::AccessGrantDao,
    base::{DaoError, with_transaction},
    invitation::InvitationDao,
    user::UserDao,
};
use crate::email::{is_valid_email, normalize_email};

#[derive(Debug, Error)]
pub enum InvitationError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Cannot invite yourself")]
    SelfInvite,
    #[error("An invitation for this account pair is already pending or accepted")]
    AlreadyInvited,
    #[error("Access request already pending")]
    AlreadyPending,
    #[error("Invitation not found or not pending")]
    NotFoundOrNotPending,
    #[error("Invitation not found or not authorized")]
    NotFoundOrNotAuthorized,
    #[error("Invitation not found, not authorized, or not accepted")]
    NotFoundNotAuthorizedOrNotAccepted,
    #[error("Access not found")]
    AccessNotFound,
    #[error("Account owner not found")]
    OwnerNotFound,
    #[error(transparent)]
    Dao(#[from] DaoError),
}

pub type InvitationResult<T> = Result<T, InvitationError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseDecision {
    Accepted,
    Declined,
}

impl ResponseDecision {
    pub fn status(self) -> InvitationStatus {
        match self {
            ResponseDecision::Accepted => InvitationStatus::Accepted,
            ResponseDecision::Declined => InvitationStatus::Declined,
        }
    }
}

pub struct InvitationService {
    client: Client,
    users: Arc<UserDao>,
    invitations: Arc<InvitationDao>,
    grants: Arc<AccessGrantDao>,
}

impl InvitationService {
    pub fn new(
        client: Client,
        users: Arc<UserDao>,
        invitations: Arc<InvitationDao>,
        grants: Arc<AccessGrantDao>,
    ) -> Self {
        Self {
            client,
            users,
            invitations,
            grants,
        }
    }

    /// Owner offers access to `invitee_email`. The invitee need not be a
    /// registered user yet.
    pub async fn send(&self, inviter: &User, invitee_email: &str) -> InvitationResult<Invitation> {
        let invitee_email = validated_email(invitee_email)?;
        if invitee_email == inviter.email {
            return Err(InvitationError::SelfInvite);
        }

        if self
            .invitations
            .find_live_for_pair(&inviter.email, &invitee_email)
            .await?
            .is_some()
        {
            return Err(InvitationError::AlreadyInvited);
        }

        let invitation = self
            .invitations
            .insert_pending(inviter.email.clone(), invitee_email, InvitationOrigin::Owner)
            .await
            .map_err(|e| match e {
                DaoError::DuplicateKey(_) => InvitationError::AlreadyInvited,
                other => other.into(),
            })?;

        info!(
            invitation_id = ?invitation.id,
            inviter = %invitation.inviter_email,
            invitee = %invitation.invitee_email,
            "Invitation sent"
        );
        Ok(invitation)
    }

    /// Resolves a pending invitation addressed to `responder`. Acceptance
    /// creates the owner -> delegate grant in the same transaction.
    pub async fn respond(
        &self,
        responder: &User,
        invitation_id: ObjectId,
        decision: ResponseDecision,
    ) -> InvitationResult<Invitation> {
        let status = decision.status();
        let responder_email = responder.email.clone();
        let invitations = Arc::clone(&self.invitations);
        let grants = Arc::clone(&self.grants);
        let users = Arc::clone(&self.users);

        let outcome = with_transaction(&self.client, move |session| {
            let invitations = Arc::clone(&invitations);
            let grants = Arc::clone(&grants);
            let users = Arc::clone(&users);
            let responder_email = responder_email.clone();
            async move {
                let Some(invitation) = invitations
                    .respond_in(session, invitation_id, &responder_email, status)
                    .await?
                else {
                    return Ok(None);
                };

                if status == InvitationStatus::Accepted {
                    let owner = users.find_by_email(&invitation.inviter_email).await?;
                    let delegate = users.find_by_email(&invitation.invitee_email).await?;
                    grants
                        .insert_in(
                            session,
                            user_id(&owner)?,
                            user_id(&delegate)?,
                            invitation_id,
                        )
                        .await?;
                }

                Ok::<_, DaoError>(Some(invitation))
            }
            .boxed()
        })
        .await;

        match outcome {
            Ok(Some(invitation)) => {
                info!(
                    %invitation_id,
                    status = invitation.status.as_str(),
                    owner = %invitation.inviter_email,
                    delegate = %invitation.invitee_email,
                    "Invitation resolved"
                );
                Ok(invitation)
            }
            Ok(None) | Err(DaoError::NotFound) => Err(InvitationError::NotFoundOrNotPending),
            Err(e) => Err(e.into()),
        }
    }

    /// Withdraws a pending invitation. Only its initiator may do so; no grant
    /// exists yet, so nothing else changes.
    pub async fn revoke(&self, by: &User, invitation_id: ObjectId) -> InvitationResult<()> {
        if !self.invitations.delete_pending(invitation_id, &by.email).await? {
            return Err(InvitationError::NotFoundOrNotAuthorized);
        }

        info!(%invitation_id, by = %by.email, "Pending invitation revoked");
        Ok(())
    }

    /// Owner-initiated revocation of granted access: deletes the accepted
    /// invitation and its grant together.
    pub async fn remove_accepted(
        &self,
        owner: &User,
        invitation_id: ObjectId,
    ) -> InvitationResult<Invitation> {
        let owner_email = owner.email.clone();
        let invitations = Arc::clone(&self.invitations);
        let grants = Arc::clone(&self.grants);

        let outcome = with_transaction(&self.client, move |session| {
            let invitations = Arc::clone(&invitations);
            let grants = Arc::clone(&grants);
            let owner_email = owner_email.clone();
            async move {
                let Some(invitation) = invitations
                    .delete_accepted_in(session, invitation_id, &owner_email)
                    .await?
                else {
                    return Ok(None);
                };
                grants.delete_for_invitation_in(session, invitation_id).await?;
                Ok::<_, DaoError>(Some(invitation))
            }
            .boxed()
        })
        .await?;

        let invitation = outcome.ok_or(InvitationError::NotFoundNotAuthorizedOrNotAccepted)?;
        info!(
            %invitation_id,
            owner = %invitation.inviter_email,
            delegate = %invitation.invitee_email,
            "Accepted invitation removed, access revoked"
        );
        Ok(invitation)
    }

    /// Delegate gives up access to `owner_id`. The grant is deleted; the
    /// accepted invitation stays as history but stops counting as live.
    pub async fn leave(&self, delegate: &User, owner_id: ObjectId) -> InvitationResult<()> {
        let delegate_id = user_id(delegate)?;
        let invitations = Arc::clone(&self.invitations);
        let grants = Arc::clone(&self.grants);

        let left = with_transaction(&self.client, move |session| {
            let invitations = Arc::clone(&invitations);
            let grants = Arc::clone(&grants);
            async move {
                let Some(grant) = grants.delete_pair_in(session, owner_id, delegate_id).await?
                else {
                    return Ok(false);
                };
                invitations.supersede_in(session, grant.invitation_id).await?;
                Ok::<_, DaoError>(true)
            }
            .boxed()
        })
        .await?;

        if !left {
            return Err(InvitationError::AccessNotFound);
        }

        info!(%owner_id, %delegate_id, "Delegate left account");
        Ok(())
    }

    /// Delegate asks `owner_email` for access after losing it. Creates a
    /// pending invitation for the same (owner, delegate) pair that the owner
    /// must accept.
    pub async fn request_access_again(
        &self,
        delegate: &User,
        owner_email: &str,
    ) -> InvitationResult<Invitation> {
        let owner_email = validated_email(owner_email)?;
        if owner_email == delegate.email {
            return Err(InvitationError::SelfInvite);
        }

        let owner = match self.users.find_by_email(&owner_email).await {
            Ok(owner) => owner,
            Err(DaoError::NotFound) => return Err(InvitationError::OwnerNotFound),
            Err(e) => return Err(e.into()),
        };

        if self
            .invitations
            .find_live_for_pair(&owner.email, &delegate.email)
            .await?
            .is_some()
        {
            return Err(InvitationError::AlreadyPending);
        }

        let invitation = self
            .invitations
            .insert_pending(
                owner.email.clone(),
                delegate.email.clone(),
                InvitationOrigin::Delegate,
            )
            .await
            .map_err(|e| match e {
                DaoError::DuplicateKey(_) => InvitationError::AlreadyPending,
                other => other.into(),
            })?;

        info!(
            invitation_id = ?invitation.id,
            owner = %invitation.inviter_email,
            delegate = %invitation.invitee_email,
            "Access requested again"
        );
        Ok(invitation)
    }

    pub async fn list_sent(&self, user: &User) -> InvitationResult<Vec<Invitation>> {
        Ok(self.invitations.find_initiated_by(&user.email).await?)
    }

    pub async fn list_received(&self, user: &User) -> InvitationResult<Vec<Invitation>> {
        Ok(self.invitations.find_addressed_to(&user.email).await?)
    }
}

fn user_id(user: &User) -> Result<ObjectId, DaoError> {
    user.id.ok_or(DaoError::NotFound)
}

fn validated_email(raw: &str) -> InvitationResult<String> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(InvitationError::InvalidEmail(raw.to_string()));
    }
    Ok(email)
}
