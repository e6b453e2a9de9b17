use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Directed edge owner -> delegate. Existence alone means the delegate may act
/// on the owner's data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner_id: ObjectId,
    pub delegate_id: ObjectId,
    /// The accepted invitation this grant was materialized from.
    pub invitation_id: ObjectId,
    pub created_at: DateTime,
}

impl AccessGrant {
    pub const COLLECTION: &'static str = "access_grants";
}
