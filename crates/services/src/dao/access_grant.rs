use bson::{doc, oid::ObjectId, DateTime};
use finshare_db::models::AccessGrant;
use mongodb::{ClientSession, Database};

use super::base::{BaseDao, DaoResult};

/// Owner -> delegate edges. Written only by the invitation workflow.
pub struct AccessGrantDao {
    pub base: BaseDao<AccessGrant>,
}

impl AccessGrantDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, AccessGrant::COLLECTION),
        }
    }

    pub async fn exists(&self, owner_id: ObjectId, delegate_id: ObjectId) -> DaoResult<bool> {
        let count = self
            .base
            .count(doc! { "owner_id": owner_id, "delegate_id": delegate_id })
            .await?;
        Ok(count > 0)
    }

    pub async fn insert_in(
        &self,
        session: &mut ClientSession,
        owner_id: ObjectId,
        delegate_id: ObjectId,
        invitation_id: ObjectId,
    ) -> DaoResult<AccessGrant> {
        let mut grant = AccessGrant {
            id: None,
            owner_id,
            delegate_id,
            invitation_id,
            created_at: DateTime::now(),
        };
        let id = self.base.insert_one_in(session, &grant).await?;
        grant.id = Some(id);
        Ok(grant)
    }

    pub async fn delete_for_invitation_in(
        &self,
        session: &mut ClientSession,
        invitation_id: ObjectId,
    ) -> DaoResult<u64> {
        let result = self
            .base
            .collection()
            .delete_many(doc! { "invitation_id": invitation_id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count)
    }

    /// Removes the edge and hands it back so the caller can retire its invitation.
    pub async fn delete_pair_in(
        &self,
        session: &mut ClientSession,
        owner_id: ObjectId,
        delegate_id: ObjectId,
    ) -> DaoResult<Option<AccessGrant>> {
        let deleted = self
            .base
            .collection()
            .find_one_and_delete(doc! { "owner_id": owner_id, "delegate_id": delegate_id })
            .session(&mut *session)
            .await?;
        Ok(deleted)
    }

    /// Owners whose data `delegate_id` may act on.
    pub async fn owners_of(&self, delegate_id: ObjectId) -> DaoResult<Vec<ObjectId>> {
        let grants = self
            .base
            .find_many(doc! { "delegate_id": delegate_id }, Some(doc! { "created_at": 1 }))
            .await?;
        Ok(grants.into_iter().map(|g| g.owner_id).collect())
    }

    pub async fn delegates_of(&self, owner_id: ObjectId) -> DaoResult<Vec<ObjectId>> {
        let grants = self
            .base
            .find_many(doc! { "owner_id": owner_id }, Some(doc! { "created_at": 1 }))
            .await?;
        Ok(grants.into_iter().map(|g| g.delegate_id).collect())
    }
}
