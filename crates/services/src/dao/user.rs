use bson::{doc, oid::ObjectId, DateTime};
use finshare_db::models::User;
use mongodb::{Database, options::ReturnDocument};
use tracing::{debug, info};

use super::base::{BaseDao, DaoError, DaoResult, map_write_error};
use crate::email::normalize_email;

/// Identity registry: maps identity-provider subjects to internal users.
pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    /// Idempotent upsert keyed by the external subject id. An existing record is
    /// returned untouched; the id, email, and display name are fixed on creation.
    pub async fn resolve(
        &self,
        external_subject_id: &str,
        email: &str,
        display_name: &str,
    ) -> DaoResult<User> {
        if let Some(user) = self.find_by_subject(external_subject_id).await? {
            return Ok(user);
        }

        let email = normalize_email(email);

        let now = DateTime::now();
        let result = self
            .base
            .collection()
            .find_one_and_update(
                doc! { "external_subject_id": external_subject_id },
                doc! {
                    "$setOnInsert": {
                        "email": &email,
                        "display_name": display_name,
                        "created_at": now,
                        "updated_at": now,
                    }
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_write_error);

        match result {
            Ok(Some(user)) => {
                info!(user_id = ?user.id, email = %user.email, "Resolved identity");
                Ok(user)
            }
            Ok(None) => Err(DaoError::NotFound),
            // A concurrent first contact for the same subject won the insert.
            Err(DaoError::DuplicateKey(msg)) => {
                debug!(external_subject_id, "Upsert raced, re-reading user");
                self.find_by_subject(external_subject_id)
                    .await?
                    .ok_or(DaoError::DuplicateKey(msg))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_by_subject(&self, external_subject_id: &str) -> DaoResult<Option<User>> {
        self.base
            .find_one(doc! { "external_subject_id": external_subject_id })
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": normalize_email(email) })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_ids(&self, ids: Vec<ObjectId>) -> DaoResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.base
            .find_many(
                doc! { "_id": { "$in": ids } },
                Some(doc! { "display_name": 1 }),
            )
            .await
    }
}
