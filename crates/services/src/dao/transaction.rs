use bson::{doc, oid::ObjectId, DateTime};
use finshare_db::models::Transaction;
use mongodb::Database;

use super::base::{BaseDao, DaoResult, PaginatedResult, PaginationParams};

pub struct TransactionDao {
    pub base: BaseDao<Transaction>,
}

impl TransactionDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Transaction::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        owner_id: ObjectId,
        created_by: ObjectId,
        amount_cents: i64,
        currency: String,
        description: String,
        occurred_at: Option<DateTime>,
    ) -> DaoResult<Transaction> {
        let now = DateTime::now();
        let mut transaction = Transaction {
            id: None,
            owner_id,
            amount_cents,
            currency,
            description,
            occurred_at: occurred_at.unwrap_or(now),
            created_by,
            created_at: now,
        };

        let id = self.base.insert_one(&transaction).await?;
        transaction.id = Some(id);
        Ok(transaction)
    }

    pub async fn list_for_owner(
        &self,
        owner_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Transaction>> {
        self.base
            .find_paginated(
                doc! { "owner_id": owner_id },
                Some(doc! { "occurred_at": -1 }),
                params,
            )
            .await
    }

    pub async fn delete_all_for_owner(&self, owner_id: ObjectId) -> DaoResult<u64> {
        self.base.hard_delete(doc! { "owner_id": owner_id }).await
    }
}
