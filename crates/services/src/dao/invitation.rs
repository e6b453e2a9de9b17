use bson::{doc, oid::ObjectId, DateTime, Document};
use finshare_db::models::{Invitation, InvitationOrigin, InvitationStatus};
use mongodb::{ClientSession, Database, options::ReturnDocument};

use super::base::{BaseDao, DaoResult};

/// Invitation store. Parties are addressed by normalized email.
pub struct InvitationDao {
    pub base: BaseDao<Invitation>,
}

impl InvitationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Invitation::COLLECTION),
        }
    }

    /// Inserts a new pending invitation. A live invitation for the same pair
    /// surfaces as `DaoError::DuplicateKey` from the partial unique index.
    pub async fn insert_pending(
        &self,
        inviter_email: String,
        invitee_email: String,
        origin: InvitationOrigin,
    ) -> DaoResult<Invitation> {
        let mut invitation = Invitation::new(inviter_email, invitee_email, origin);
        let id = self.base.insert_one(&invitation).await?;
        invitation.id = Some(id);
        Ok(invitation)
    }

    pub async fn find_live_for_pair(
        &self,
        inviter_email: &str,
        invitee_email: &str,
    ) -> DaoResult<Option<Invitation>> {
        self.base
            .find_one(doc! {
                "inviter_email": inviter_email,
                "invitee_email": invitee_email,
                "live": true,
            })
            .await
    }

    /// Invitations the given party created.
    pub async fn find_initiated_by(&self, email: &str) -> DaoResult<Vec<Invitation>> {
        self.base
            .find_many(initiator_filter(email), Some(doc! { "created_at": -1 }))
            .await
    }

    /// Invitations awaiting (or resolved by) the given party.
    pub async fn find_addressed_to(&self, email: &str) -> DaoResult<Vec<Invitation>> {
        self.base
            .find_many(recipient_filter(email), Some(doc! { "created_at": -1 }))
            .await
    }

    /// Moves a pending invitation addressed to `responder_email` into `status`.
    /// Returns `None` when no such pending invitation exists.
    pub async fn respond_in(
        &self,
        session: &mut ClientSession,
        id: ObjectId,
        responder_email: &str,
        status: InvitationStatus,
    ) -> DaoResult<Option<Invitation>> {
        let mut filter = recipient_filter(responder_email);
        filter.insert("_id", id);
        filter.insert("status", InvitationStatus::Pending.as_str());

        let updated = self
            .base
            .collection()
            .find_one_and_update(
                filter,
                doc! {
                    "$set": {
                        "status": status.as_str(),
                        "live": status.is_live(),
                        "updated_at": DateTime::now(),
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .session(&mut *session)
            .await?;
        Ok(updated)
    }

    /// Deletes a pending invitation on behalf of its initiator.
    pub async fn delete_pending(&self, id: ObjectId, initiator_email: &str) -> DaoResult<bool> {
        let mut filter = initiator_filter(initiator_email);
        filter.insert("_id", id);
        filter.insert("status", InvitationStatus::Pending.as_str());

        let result = self.base.collection().delete_one(filter).await?;
        Ok(result.deleted_count > 0)
    }

    /// Deletes an accepted invitation on behalf of the owner (the inviter).
    pub async fn delete_accepted_in(
        &self,
        session: &mut ClientSession,
        id: ObjectId,
        inviter_email: &str,
    ) -> DaoResult<Option<Invitation>> {
        let deleted = self
            .base
            .collection()
            .find_one_and_delete(doc! {
                "_id": id,
                "inviter_email": inviter_email,
                "status": InvitationStatus::Accepted.as_str(),
            })
            .session(&mut *session)
            .await?;
        Ok(deleted)
    }

    /// Marks an accepted invitation as no longer backing a grant. The status
    /// stays `accepted` so the record remains as history.
    pub async fn supersede_in(&self, session: &mut ClientSession, id: ObjectId) -> DaoResult<bool> {
        let now = DateTime::now();
        let result = self
            .base
            .collection()
            .update_one(
                doc! { "_id": id, "status": InvitationStatus::Accepted.as_str() },
                doc! {
                    "$set": {
                        "live": false,
                        "superseded_at": now,
                        "updated_at": now,
                    }
                },
            )
            .session(&mut *session)
            .await?;
        Ok(result.modified_count > 0)
    }
}

const ORIGINS: [InvitationOrigin; 2] = [InvitationOrigin::Owner, InvitationOrigin::Delegate];

fn initiator_filter(email: &str) -> Document {
    role_filter(email, InvitationOrigin::initiator_field)
}

fn recipient_filter(email: &str) -> Document {
    role_filter(email, InvitationOrigin::recipient_field)
}

fn role_filter(email: &str, field: fn(&InvitationOrigin) -> &'static str) -> Document {
    let clauses: Vec<Document> = ORIGINS
        .iter()
        .map(|origin| doc! { "origin": origin.as_str(), field(origin): email })
        .collect();
    doc! { "$or": clauses }
}
