use bson::{doc, oid::ObjectId, Document};
use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database,
    error::{TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum DaoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("BSON serialization error: {0}")]
    BsonSer(#[from] bson::ser::Error),
    #[error("BSON deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),
    #[error("Entity not found")]
    NotFound,
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Validation: {0}")]
    Validation(String),
}

impl DaoError {
    /// Whether the whole transaction may be re-run from the start.
    pub fn is_transient(&self) -> bool {
        matches!(self, DaoError::Mongo(e) if e.contains_label(TRANSIENT_TRANSACTION_ERROR))
    }
}

pub type DaoResult<T> = Result<T, DaoError>;

/// Maps a write failure to `DuplicateKey` when it violated a unique index.
pub fn map_write_error(e: mongodb::error::Error) -> DaoError {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(
        ref write_error,
    )) = *e.kind
    {
        if write_error.code == 11000 {
            return DaoError::DuplicateKey(write_error.message.clone());
        }
    }
    // findAndModify reports unique violations as command errors.
    if let mongodb::error::ErrorKind::Command(ref command_error) = *e.kind {
        if command_error.code == 11000 {
            return DaoError::DuplicateKey(command_error.message.clone());
        }
    }
    DaoError::Mongo(e)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    const MAX_PER_PAGE: u64 = 200;

    /// Clamped `(page, per_page, skip)`. Any `page` value is accepted.
    pub fn window(&self) -> (u64, u64, u64) {
        let per_page = self.per_page.clamp(1, Self::MAX_PER_PAGE);
        let page = self.page.max(1);
        let skip = (page - 1).saturating_mul(per_page);
        (page, per_page, skip)
    }
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    25
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

pub struct BaseDao<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T: Send + Sync> Clone for BaseDao<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
        }
    }
}

impl<T> BaseDao<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Unpin + Send + Sync,
{
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<T>(collection_name),
        }
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub async fn find_one(&self, filter: Document) -> DaoResult<Option<T>> {
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> DaoResult<Vec<T>> {
        let mut cursor = if let Some(sort) = sort {
            self.collection.find(filter).sort(sort).await?
        } else {
            self.collection.find(filter).await?
        };

        let mut results = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            results.push(doc);
        }
        Ok(results)
    }

    pub async fn find_paginated(
        &self,
        filter: Document,
        sort: Option<Document>,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<T>> {
        let (page, per_page, skip) = params.window();
        let total = self.collection.count_documents(filter.clone()).await?;

        // Pages past the end never reach the server.
        let mut items = Vec::new();
        if skip < total {
            let sort = sort.unwrap_or_else(|| doc! { "created_at": -1 });
            let mut cursor = self
                .collection
                .find(filter)
                .sort(sort)
                .skip(skip)
                .limit(per_page as i64)
                .await?;

            while let Some(doc) = cursor.try_next().await? {
                items.push(doc);
            }
        }

        let total_pages = total.div_ceil(per_page);

        Ok(PaginatedResult {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    pub async fn insert_one(&self, doc: &T) -> DaoResult<ObjectId> {
        let result = self
            .collection
            .insert_one(doc)
            .await
            .map_err(map_write_error)?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| DaoError::Validation("inserted_id is not an ObjectId".to_string()))?;
        debug!(?id, "Inserted document");
        Ok(id)
    }

    pub async fn insert_one_in(
        &self,
        session: &mut ClientSession,
        doc: &T,
    ) -> DaoResult<ObjectId> {
        let result = self
            .collection
            .insert_one(doc)
            .session(&mut *session)
            .await
            .map_err(map_write_error)?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| DaoError::Validation("inserted_id is not an ObjectId".to_string()))?;
        debug!(?id, "Inserted document in transaction");
        Ok(id)
    }

    pub async fn hard_delete(&self, filter: Document) -> DaoResult<u64> {
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    pub async fn count(&self, filter: Document) -> DaoResult<u64> {
        Ok(self.collection.count_documents(filter).await?)
    }
}

/// Runs `op` inside a multi-document transaction.
///
/// The whole unit is re-run when the server labels the failure
/// `TransientTransactionError` (e.g. a write conflict with a concurrent
/// transition), and the commit alone is retried on
/// `UnknownTransactionCommitResult`. Either every write in `op` commits or none
/// does.
pub async fn with_transaction<T, F>(client: &Client, mut op: F) -> DaoResult<T>
where
    F: for<'s> FnMut(&'s mut ClientSession) -> BoxFuture<'s, DaoResult<T>>,
{
    let mut session = client.start_session().await?;
    let mut attempt = 0;

    'transaction: loop {
        attempt += 1;
        session.start_transaction().await?;

        let value = match op(&mut session).await {
            Ok(value) => value,
            Err(err) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    debug!(error = %abort_err, "Abort after failed transaction body");
                }
                if err.is_transient() && attempt < MAX_TRANSACTION_ATTEMPTS {
                    warn!(attempt, error = %err, "Retrying transient transaction failure");
                    continue 'transaction;
                }
                return Err(err);
            }
        };

        let mut commit_attempt = 0;
        loop {
            commit_attempt += 1;
            match session.commit_transaction().await {
                Ok(()) => return Ok(value),
                Err(e)
                    if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                        && commit_attempt < MAX_TRANSACTION_ATTEMPTS =>
                {
                    warn!(commit_attempt, error = %e, "Retrying commit with unknown result");
                }
                Err(e)
                    if e.contains_label(TRANSIENT_TRANSACTION_ERROR)
                        && attempt < MAX_TRANSACTION_ATTEMPTS =>
                {
                    warn!(attempt, error = %e, "Retrying transaction after transient commit failure");
                    continue 'transaction;
                }
                Err(e) => return Err(DaoError::Mongo(e)),
            }
        }
    }
}
