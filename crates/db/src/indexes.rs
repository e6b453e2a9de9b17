use bson::Document;
use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{AccessGrant, Invitation, Transaction, User};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "external_subject_id": 1 }),
            index_unique(bson::doc! { "email": 1 }),
        ],
    )
    .await?;

    // Invitations: at most one live invitation per ordered (owner, delegate) email pair.
    create_indexes(
        db,
        Invitation::COLLECTION,
        vec![
            index_unique_partial(
                bson::doc! { "inviter_email": 1, "invitee_email": 1 },
                bson::doc! { "live": true },
            ),
            index(bson::doc! { "inviter_email": 1, "status": 1 }),
            index(bson::doc! { "invitee_email": 1, "status": 1 }),
        ],
    )
    .await?;

    // Access grants
    create_indexes(
        db,
        AccessGrant::COLLECTION,
        vec![
            index_unique(bson::doc! { "owner_id": 1, "delegate_id": 1 }),
            index(bson::doc! { "delegate_id": 1 }),
            index(bson::doc! { "invitation_id": 1 }),
        ],
    )
    .await?;

    // Transactions
    create_indexes(
        db,
        Transaction::COLLECTION,
        vec![index(bson::doc! { "owner_id": 1, "occurred_at": -1 })],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn index_unique_partial(keys: Document, filter: Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(filter)
                .build(),
        )
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
