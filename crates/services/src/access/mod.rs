use bson::oid::ObjectId;
use finshare_db::models::User;
use std::sync::Arc;
use tracing::debug;

use crate::dao::{
    access_grant::AccessGrantDao,
    base::{DaoError, DaoResult},
    user::UserDao,
};

/// An account the requester may act on.
#[derive(Debug, Clone)]
pub struct AccessibleAccount {
    pub user: User,
    pub is_own: bool,
}

/// Read-only authorization over the access-grant relation. Every call goes to
/// storage; decisions are never cached across requests.
pub struct AccessService {
    grants: Arc<AccessGrantDao>,
    users: Arc<UserDao>,
}

impl AccessService {
    pub fn new(grants: Arc<AccessGrantDao>, users: Arc<UserDao>) -> Self {
        Self { grants, users }
    }

    pub async fn has_account_access(
        &self,
        requester_id: ObjectId,
        owner_id: ObjectId,
    ) -> DaoResult<bool> {
        if requester_id == owner_id {
            return Ok(true);
        }

        let granted = self.grants.exists(owner_id, requester_id).await?;
        if !granted {
            debug!(%requester_id, %owner_id, "No grant for account");
        }
        Ok(granted)
    }

    /// True when `user_id` reaches `owner_id` through a grant rather than by
    /// being the owner. Delegates may not perform owner-only actions.
    pub async fn is_subaccount(&self, user_id: ObjectId, owner_id: ObjectId) -> DaoResult<bool> {
        if user_id == owner_id {
            return Ok(false);
        }
        self.grants.exists(owner_id, user_id).await
    }

    /// The user's own account first, then every owner that granted them access.
    pub async fn list_accessible_accounts(&self, user: &User) -> DaoResult<Vec<AccessibleAccount>> {
        let user_id = user.id.ok_or(DaoError::NotFound)?;
        let owner_ids = self.grants.owners_of(user_id).await?;
        let owners = self.users.find_by_ids(owner_ids).await?;

        let mut accounts = Vec::with_capacity(owners.len() + 1);
        accounts.push(AccessibleAccount {
            user: user.clone(),
            is_own: true,
        });
        accounts.extend(
            owners
                .into_iter()
                .filter(|owner| owner.id != Some(user_id))
                .map(|owner| AccessibleAccount {
                    user: owner,
                    is_own: false,
                }),
        );
        Ok(accounts)
    }

    pub async fn list_delegates(&self, owner_id: ObjectId) -> DaoResult<Vec<User>> {
        let delegate_ids = self.grants.delegates_of(owner_id).await?;
        self.users.find_by_ids(delegate_ids).await
    }
}
