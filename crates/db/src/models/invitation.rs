use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Email-addressed offer of delegated access.
///
/// `inviter_email` is always the account owner's side of the pair and
/// `invitee_email` the prospective delegate, whichever party initiated it.
/// `origin` records the initiator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub inviter_email: String,
    pub invitee_email: String,
    #[serde(default)]
    pub origin: InvitationOrigin,
    pub status: InvitationStatus,
    /// Backs the unique partial index on the email pair. True while the status
    /// is live and the delegate has not left.
    #[serde(default)]
    pub live: bool,
    pub superseded_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    /// Reserved for a future TTL policy; nothing transitions into it yet.
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, InvitationStatus::Pending | InvitationStatus::Accepted)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvitationOrigin {
    /// The owner invited the delegate.
    #[default]
    Owner,
    /// The delegate asked the owner for access again.
    Delegate,
}

impl InvitationOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationOrigin::Owner => "owner",
            InvitationOrigin::Delegate => "delegate",
        }
    }

    /// Field holding the party who created the invitation and may revoke it
    /// while pending.
    pub fn initiator_field(&self) -> &'static str {
        match self {
            InvitationOrigin::Owner => "inviter_email",
            InvitationOrigin::Delegate => "invitee_email",
        }
    }

    /// Field holding the party the invitation is addressed to, the only one
    /// who may respond.
    pub fn recipient_field(&self) -> &'static str {
        match self {
            InvitationOrigin::Owner => "invitee_email",
            InvitationOrigin::Delegate => "inviter_email",
        }
    }
}

impl Invitation {
    pub const COLLECTION: &'static str = "invitations";

    pub fn new(inviter_email: String, invitee_email: String, origin: InvitationOrigin) -> Self {
        let now = DateTime::now();
        Self {
            id: None,
            inviter_email,
            invitee_email,
            origin,
            status: InvitationStatus::Pending,
            live: true,
            superseded_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
