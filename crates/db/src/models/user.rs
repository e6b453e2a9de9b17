use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Internal account record, created lazily the first time an identity-provider
/// subject authenticates. `id` never changes once assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub external_subject_id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl User {
    pub const COLLECTION: &'static str = "users";
}
