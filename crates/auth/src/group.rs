//! Group directory: named groups, membership and permission attachment.

use std::sync::Arc;

use storekeep_core::{GroupId, PermissionId, UserId};

use crate::error::AuthError;
use crate::store::{
    AuthStores, GroupGrant, GroupPermissionStore, GroupRecord, GroupStore, MembershipStore,
    StoreError,
};

/// Facade over group, membership and group-permission storage.
///
/// All adds are idempotent: a duplicate row reported by storage is treated
/// as success, so concurrent callers and re-runs converge on the same state.
#[derive(Clone)]
pub struct GroupDirectory {
    groups: Arc<dyn GroupStore>,
    memberships: Arc<dyn MembershipStore>,
    group_permissions: Arc<dyn GroupPermissionStore>,
}

impl GroupDirectory {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        memberships: Arc<dyn MembershipStore>,
        group_permissions: Arc<dyn GroupPermissionStore>,
    ) -> Self {
        Self {
            groups,
            memberships,
            group_permissions,
        }
    }

    pub fn from_stores(stores: &AuthStores) -> Self {
        Self::new(
            stores.groups.clone(),
            stores.memberships.clone(),
            stores.group_permissions.clone(),
        )
    }

    /// Look up a group by name, creating it (empty) if absent.
    pub async fn get_or_create(&self, name: &str) -> Result<GroupRecord, AuthError> {
        if let Some(group) = self.groups.get_by_name(name).await? {
            return Ok(group);
        }

        match self.groups.create(name).await {
            Ok(group) => {
                tracing::debug!(group = %group.name, "created group");
                Ok(group)
            }
            Err(StoreError::AlreadyExists) => {
                self.groups.get_by_name(name).await?.ok_or_else(|| {
                    AuthError::NotFound(format!("group {name} reported as existing but not found"))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Idempotent membership add.
    pub async fn add_user(&self, group: &GroupRecord, user_id: UserId) -> Result<(), AuthError> {
        match self.memberships.add(user_id, group.id).await {
            Ok(()) | Err(StoreError::AlreadyExists) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a user from a group; removing a non-member is a no-op.
    pub async fn remove_user(&self, group: &GroupRecord, user_id: UserId) -> Result<(), AuthError> {
        self.memberships.remove(user_id, group.id).await?;
        Ok(())
    }

    /// Idempotent permission attachment.
    pub async fn attach_permission(
        &self,
        group: &GroupRecord,
        permission_id: PermissionId,
    ) -> Result<(), AuthError> {
        match self.group_permissions.add(group.id, permission_id).await {
            Ok(()) | Err(StoreError::AlreadyExists) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// All groups the user belongs to.
    pub async fn groups_for_user(&self, user_id: UserId) -> Result<Vec<GroupRecord>, AuthError> {
        let memberships = self.memberships.list_for_user(user_id).await?;
        let ids: Vec<GroupId> = memberships.iter().map(|m| m.group_id).collect();
        Ok(self.groups.list_by_ids(&ids).await?)
    }

    /// All permission attachments of a group.
    pub async fn permissions_for_group(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<GroupGrant>, AuthError> {
        Ok(self.group_permissions.list_for_group(group_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAuthStore;

    #[tokio::test]
    async fn get_or_create_reuses_group_by_name() {
        let store = MemoryAuthStore::new();
        let directory = GroupDirectory::from_stores(&store.stores());

        let first = directory.get_or_create("Cashier").await.unwrap();
        let second = directory.get_or_create("Cashier").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn duplicate_membership_add_is_silently_accepted() {
        let store = MemoryAuthStore::new();
        let directory = GroupDirectory::from_stores(&store.stores());
        let group = directory.get_or_create("Manager").await.unwrap();
        let user_id = UserId::new(7);

        directory.add_user(&group, user_id).await.unwrap();
        directory.add_user(&group, user_id).await.unwrap();

        let groups = directory.groups_for_user(user_id).await.unwrap();
        assert_eq!(groups.len(), 1);
    }
}
