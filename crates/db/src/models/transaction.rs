use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner_id: ObjectId,
    pub amount_cents: i64,
    pub currency: String,
    #[serde(default)]
    pub description: String,
    pub occurred_at: DateTime,
    /// Differs from `owner_id` when a delegate recorded it.
    pub created_by: ObjectId,
    pub created_at: DateTime,
}

impl Transaction {
    pub const COLLECTION: &'static str = "transactions";
}
