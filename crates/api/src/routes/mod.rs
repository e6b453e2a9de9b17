pub mod account;
pub mod invitation;
pub mod transaction;
pub mod user;

use bson::{DateTime, oid::ObjectId};

use crate::error::ApiError;

pub(crate) fn parse_id(raw: &str, name: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {}", name)))
}

pub(crate) fn id_hex(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

pub(crate) fn rfc3339(dt: DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}
