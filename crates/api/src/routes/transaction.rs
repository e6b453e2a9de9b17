use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use bson::DateTime;
use chrono::Utc;
use finshare_db::models::Transaction;
use finshare_services::dao::base::PaginationParams;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{id_hex, rfc3339};
use crate::{error::ApiError, extractors::account::ActingAccount, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub amount_cents: i64,
    pub currency: String,
    #[serde(default)]
    pub description: String,
    pub occurred_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub owner_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub description: String,
    pub occurred_at: String,
    pub created_by: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: id_hex(t.id),
            owner_id: t.owner_id.to_hex(),
            amount_cents: t.amount_cents,
            currency: t.currency,
            description: t.description,
            occurred_at: rfc3339(t.occurred_at),
            created_by: t.created_by.to_hex(),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    account: ActingAccount,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state
        .transactions
        .list_for_owner(account.owner_id, &params)
        .await?;

    let items: Vec<TransactionResponse> = result.items.into_iter().map(Into::into).collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "total": result.total,
        "page": result.page,
        "per_page": result.per_page,
        "total_pages": result.total_pages,
    })))
}

pub async fn create(
    State(state): State<AppState>,
    account: ActingAccount,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let currency = body.currency.trim().to_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::Validation(
            "currency must be a three-letter ISO code".to_string(),
        ));
    }

    let transaction = state
        .transactions
        .create(
            account.owner_id,
            account.requester.user_id,
            body.amount_cents,
            currency,
            body.description,
            body.occurred_at.map(DateTime::from_chrono),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// Deletes every transaction of the account. Owner only.
pub async fn delete_all(
    State(state): State<AppState>,
    account: ActingAccount,
) -> Result<Json<serde_json::Value>, ApiError> {
    account.require_owner(&state).await?;

    let deleted = state
        .transactions
        .delete_all_for_owner(account.owner_id)
        .await?;
    info!(owner_id = %account.owner_id, deleted, "Bulk-deleted account transactions");

    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
