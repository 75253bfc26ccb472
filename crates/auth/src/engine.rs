//! Authorization check engine: allow/deny decisions for users.

use std::sync::Arc;

use crate::cache::PermissionCache;
use crate::catalog::PermissionCatalog;
use crate::error::AuthError;
use crate::permission::{Action, PermissionRecord, ResourceType};
use crate::store::{
    AuthStores, GroupPermissionStore, MembershipStore, PermissionFilter, PermissionStore,
};
use crate::user::User;

/// Decides whether a user holds a permission.
///
/// Superusers bypass every check. For everyone else the decision resolves
/// through the user's groups' attached permissions; a `false` result is a
/// normal outcome, not an error.
#[derive(Clone)]
pub struct AccessEngine {
    catalog: PermissionCatalog,
    permissions: Arc<dyn PermissionStore>,
    memberships: Arc<dyn MembershipStore>,
    group_permissions: Arc<dyn GroupPermissionStore>,
}

impl AccessEngine {
    pub fn new(
        catalog: PermissionCatalog,
        permissions: Arc<dyn PermissionStore>,
        memberships: Arc<dyn MembershipStore>,
        group_permissions: Arc<dyn GroupPermissionStore>,
    ) -> Self {
        Self {
            catalog,
            permissions,
            memberships,
            group_permissions,
        }
    }

    pub fn from_stores(stores: &AuthStores, cache: Arc<dyn PermissionCache>) -> Self {
        Self::new(
            PermissionCatalog::from_stores(stores, cache),
            stores.permissions.clone(),
            stores.memberships.clone(),
            stores.group_permissions.clone(),
        )
    }

    /// Does `user` hold `permission`?
    ///
    /// The permission's resource type is lazily materialized on first check,
    /// so no separate provisioning step is required. The permission itself
    /// must be a recognized member of that resource type's set.
    pub async fn has_permission(
        &self,
        user: &User,
        permission: &PermissionRecord,
    ) -> Result<bool, AuthError> {
        if user.is_superuser {
            return Ok(true);
        }

        let resource = ResourceType::new(permission.resource_type.clone());
        let (known, _) = self.catalog.ensure_basic_permissions(&resource).await?;
        if !known.iter().any(|p| p.id == permission.id) {
            return Ok(false);
        }

        for membership in self.memberships.list_for_user(user.id).await? {
            let grants = self
                .group_permissions
                .list_for_group(membership.group_id)
                .await?;
            if grants.iter().any(|g| g.permission_id == permission.id) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Does `user` hold the permission for `(resource, action)`?
    ///
    /// An unprovisioned permission can never be granted: if no record matches
    /// the derived codename the answer is `false`. More than one matching
    /// record is a broken invariant, not a valid state.
    pub async fn has_resource_permission(
        &self,
        user: &User,
        resource: &ResourceType,
        action: &Action,
    ) -> Result<bool, AuthError> {
        if user.is_superuser {
            return Ok(true);
        }

        let codename = resource.codename(action);
        let found = self
            .permissions
            .search(&PermissionFilter::exact(resource.as_str(), &codename))
            .await?;

        match found.len() {
            0 => Ok(false),
            1 => self.has_permission(user, &found[0]).await,
            n => Err(AuthError::InvariantViolation(format!(
                "{n} permissions found for {resource} with codename {codename}"
            ))),
        }
    }

    /// Every permission the user holds.
    ///
    /// Recomputed on each call. For a superuser this is the whole catalog;
    /// otherwise permissions are yielded per group attachment, without
    /// deduplication across groups.
    pub async fn all_permissions(&self, user: &User) -> Result<Vec<PermissionRecord>, AuthError> {
        if user.is_superuser {
            return Ok(self.permissions.list_all().await?);
        }

        let mut out = Vec::new();
        for membership in self.memberships.list_for_user(user.id).await? {
            let grants = self
                .group_permissions
                .list_for_group(membership.group_id)
                .await?;
            for grant in grants {
                out.push(self.permissions.get(grant.permission_id).await?);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use storekeep_core::EmployeeRole;

    use super::*;
    use crate::cache::InMemoryPermissionCache;
    use crate::group::GroupDirectory;
    use crate::permission::BasicAction;
    use crate::role::RoleAssignments;
    use crate::store::{MemoryAuthStore, UserStore};
    use crate::user::NewUser;

    async fn user(store: &Arc<MemoryAuthStore>, name: &str, superuser: bool) -> User {
        UserStore::create(
            &**store,
            NewUser {
                username: name.to_string(),
                password_hash: "x".to_string(),
                is_superuser: superuser,
            },
        )
        .await
        .unwrap()
    }

    fn engine(store: &Arc<MemoryAuthStore>) -> AccessEngine {
        AccessEngine::from_stores(&store.stores(), Arc::new(InMemoryPermissionCache::new()))
    }

    #[tokio::test]
    async fn superuser_bypasses_all_checks() {
        let store = MemoryAuthStore::new();
        let engine = engine(&store);
        let root = user(&store, "root", true).await;

        // No groups, not even a provisioned permission: still allowed.
        let allowed = engine
            .has_resource_permission(&root, &ResourceType::CHECK, &BasicAction::Delete.into())
            .await
            .unwrap();
        assert!(allowed);

        let permission = PermissionRecord {
            id: storekeep_core::PermissionId::new(999),
            resource_type: "Check".to_string(),
            codename: "check.can_delete".to_string(),
        };
        assert!(engine.has_permission(&root, &permission).await.unwrap());
    }

    #[tokio::test]
    async fn cashier_grant_resolution() {
        let store = MemoryAuthStore::new();
        let cache: Arc<dyn crate::cache::PermissionCache> =
            Arc::new(InMemoryPermissionCache::new());
        let roles = RoleAssignments::from_stores(&store.stores(), cache.clone());
        let engine = AccessEngine::from_stores(&store.stores(), cache);
        let cashier = user(&store, "kasia", false).await;

        roles.ensure_role_group(EmployeeRole::Cashier).await.unwrap();
        roles.assign_user(EmployeeRole::Cashier, &cashier).await.unwrap();

        let can_create = engine
            .has_resource_permission(&cashier, &ResourceType::CHECK, &BasicAction::Create.into())
            .await
            .unwrap();
        assert!(can_create);

        let can_delete = engine
            .has_resource_permission(&cashier, &ResourceType::CHECK, &BasicAction::Delete.into())
            .await
            .unwrap();
        assert!(!can_delete);
    }

    #[tokio::test]
    async fn unprovisioned_permission_is_never_granted() {
        let store = MemoryAuthStore::new();
        let engine = engine(&store);
        let plain = user(&store, "plain", false).await;

        let allowed = engine
            .has_resource_permission(&plain, &ResourceType::EMPLOYEE, &Action::named("fire_everyone"))
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn provisioned_but_ungranted_permission_is_denied() {
        let store = MemoryAuthStore::new();
        let engine = engine(&store);
        let plain = user(&store, "plain", false).await;

        PermissionStore::create(&*store, "Employee", "employee.view_self")
            .await
            .unwrap();

        let allowed = engine
            .has_resource_permission(&plain, &ResourceType::EMPLOYEE, &Action::named("view_self"))
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn all_permissions_without_group_dedup() {
        let store = MemoryAuthStore::new();
        let cache: Arc<dyn crate::cache::PermissionCache> =
            Arc::new(InMemoryPermissionCache::new());
        let directory = GroupDirectory::from_stores(&store.stores());
        let catalog = PermissionCatalog::from_stores(&store.stores(), cache.clone());
        let engine = AccessEngine::from_stores(&store.stores(), cache);
        let plain = user(&store, "plain", false).await;

        let a = catalog
            .get_or_create(&ResourceType::CATEGORY, &BasicAction::View.into())
            .await
            .unwrap();
        let b = catalog
            .get_or_create(&ResourceType::PRODUCT, &BasicAction::View.into())
            .await
            .unwrap();
        let c = catalog
            .get_or_create(&ResourceType::CHECK, &BasicAction::Create.into())
            .await
            .unwrap();

        let first = directory.get_or_create("first").await.unwrap();
        let second = directory.get_or_create("second").await.unwrap();
        directory.attach_permission(&first, a.id).await.unwrap();
        directory.attach_permission(&first, b.id).await.unwrap();
        directory.attach_permission(&second, c.id).await.unwrap();
        directory.add_user(&first, plain.id).await.unwrap();
        directory.add_user(&second, plain.id).await.unwrap();

        let yielded = engine.all_permissions(&plain).await.unwrap();
        let codenames: HashSet<String> = yielded.iter().map(|p| p.codename.clone()).collect();
        assert_eq!(yielded.len(), 3);
        assert_eq!(
            codenames,
            HashSet::from([
                "category.can_view".to_string(),
                "product.can_view".to_string(),
                "check.can_create".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn superuser_enumerates_whole_catalog() {
        let store = MemoryAuthStore::new();
        let cache: Arc<dyn crate::cache::PermissionCache> =
            Arc::new(InMemoryPermissionCache::new());
        let catalog = PermissionCatalog::from_stores(&store.stores(), cache.clone());
        let engine = AccessEngine::from_stores(&store.stores(), cache);
        let root = user(&store, "root", true).await;

        catalog
            .ensure_basic_permissions(&ResourceType::PRODUCT)
            .await
            .unwrap();

        let yielded = engine.all_permissions(&root).await.unwrap();
        assert_eq!(yielded.len(), 4);
    }
}
