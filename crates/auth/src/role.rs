//! Role definition registry: static grant tables per employee role.
//!
//! Role groups are lazily materialized: `ensure_role_group` resolves or
//! creates the group named after the role, then resolves/creates and attaches
//! every declared permission. Nothing here owns state beyond the tables.

use std::sync::Arc;

use storekeep_core::EmployeeRole;

use crate::cache::PermissionCache;
use crate::catalog::PermissionCatalog;
use crate::error::AuthError;
use crate::group::GroupDirectory;
use crate::permission::{Action, BasicAction, ResourceType};
use crate::store::{AuthStores, GroupRecord};
use crate::user::User;

const CASHIER_GRANTS: &[(ResourceType, Action)] = &[
    (ResourceType::CATEGORY, Action::Basic(BasicAction::View)),
    (ResourceType::CUSTOMER_CARD, Action::Basic(BasicAction::View)),
    (ResourceType::CUSTOMER_CARD, Action::Basic(BasicAction::Update)),
    (ResourceType::STORE_PRODUCT, Action::Basic(BasicAction::View)),
    (ResourceType::PRODUCT, Action::Basic(BasicAction::View)),
    (ResourceType::CHECK, Action::Basic(BasicAction::View)),
    (ResourceType::CHECK, Action::Basic(BasicAction::Create)),
    (ResourceType::EMPLOYEE, Action::named("view_self")),
];

const PDF_EXPORT: &str = "print_to_pdf";

const MANAGER_GRANTS: &[(ResourceType, Action)] = &[
    (ResourceType::EMPLOYEE, Action::Basic(BasicAction::View)),
    (ResourceType::EMPLOYEE, Action::Basic(BasicAction::Create)),
    (ResourceType::EMPLOYEE, Action::Basic(BasicAction::Update)),
    (ResourceType::EMPLOYEE, Action::Basic(BasicAction::Delete)),
    (ResourceType::CATEGORY, Action::Basic(BasicAction::View)),
    (ResourceType::CATEGORY, Action::Basic(BasicAction::Create)),
    (ResourceType::CATEGORY, Action::Basic(BasicAction::Update)),
    (ResourceType::CATEGORY, Action::Basic(BasicAction::Delete)),
    (ResourceType::PRODUCT, Action::Basic(BasicAction::View)),
    (ResourceType::PRODUCT, Action::Basic(BasicAction::Create)),
    (ResourceType::PRODUCT, Action::Basic(BasicAction::Update)),
    (ResourceType::PRODUCT, Action::Basic(BasicAction::Delete)),
    (ResourceType::STORE_PRODUCT, Action::Basic(BasicAction::View)),
    (ResourceType::STORE_PRODUCT, Action::Basic(BasicAction::Create)),
    (ResourceType::STORE_PRODUCT, Action::Basic(BasicAction::Update)),
    (ResourceType::STORE_PRODUCT, Action::Basic(BasicAction::Delete)),
    (ResourceType::CUSTOMER_CARD, Action::Basic(BasicAction::View)),
    (ResourceType::CUSTOMER_CARD, Action::Basic(BasicAction::Create)),
    (ResourceType::CUSTOMER_CARD, Action::Basic(BasicAction::Update)),
    (ResourceType::CUSTOMER_CARD, Action::Basic(BasicAction::Delete)),
    (ResourceType::CHECK, Action::Basic(BasicAction::View)),
    (ResourceType::CHECK, Action::Basic(BasicAction::Delete)),
    (ResourceType::EMPLOYEE, Action::named(PDF_EXPORT)),
    (ResourceType::CUSTOMER_CARD, Action::named(PDF_EXPORT)),
    (ResourceType::CATEGORY, Action::named(PDF_EXPORT)),
    (ResourceType::PRODUCT, Action::named(PDF_EXPORT)),
    (ResourceType::STORE_PRODUCT, Action::named(PDF_EXPORT)),
    (ResourceType::CHECK, Action::named(PDF_EXPORT)),
];

/// Group name a role materializes as.
pub fn group_name(role: EmployeeRole) -> &'static str {
    match role {
        EmployeeRole::Cashier => "Cashier",
        EmployeeRole::Manager => "Manager",
    }
}

/// The (resource type, action) pairs a role grants, in declaration order.
pub fn grants(role: EmployeeRole) -> &'static [(ResourceType, Action)] {
    match role {
        EmployeeRole::Cashier => CASHIER_GRANTS,
        EmployeeRole::Manager => MANAGER_GRANTS,
    }
}

/// Orchestrates role-group materialization and membership.
#[derive(Clone)]
pub struct RoleAssignments {
    catalog: PermissionCatalog,
    directory: GroupDirectory,
}

impl RoleAssignments {
    pub fn new(catalog: PermissionCatalog, directory: GroupDirectory) -> Self {
        Self { catalog, directory }
    }

    pub fn from_stores(stores: &AuthStores, cache: Arc<dyn PermissionCache>) -> Self {
        Self::new(
            PermissionCatalog::from_stores(stores, cache),
            GroupDirectory::from_stores(stores),
        )
    }

    /// Resolve or create the role's group and attach every declared
    /// permission (already-attached pairs are silently accepted).
    pub async fn ensure_role_group(&self, role: EmployeeRole) -> Result<GroupRecord, AuthError> {
        let group = self.directory.get_or_create(group_name(role)).await?;

        for (resource, action) in grants(role) {
            let permission = self.catalog.get_or_create(resource, action).await?;
            self.directory.attach_permission(&group, permission.id).await?;
        }

        Ok(group)
    }

    /// Ensure the role group exists and add the user as a member.
    pub async fn assign_user(&self, role: EmployeeRole, user: &User) -> Result<(), AuthError> {
        let group = self.ensure_role_group(role).await?;
        self.directory.add_user(&group, user.id).await?;
        tracing::debug!(user = %user.username, role = %role, "assigned role group");
        Ok(())
    }

    /// Ensure the role group exists and remove the user from membership.
    /// Removing a non-member is a no-op.
    pub async fn unassign_user(&self, role: EmployeeRole, user: &User) -> Result<(), AuthError> {
        let group = self.ensure_role_group(role).await?;
        self.directory.remove_user(&group, user.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryPermissionCache;
    use crate::store::{MemoryAuthStore, MembershipStore, UserStore};
    use crate::user::NewUser;

    async fn seeded_user(store: &Arc<MemoryAuthStore>) -> User {
        UserStore::create(
            &**store,
            NewUser {
                username: "olena".to_string(),
                password_hash: "x".to_string(),
                is_superuser: false,
            },
        )
        .await
        .unwrap()
    }

    fn assignments(store: &Arc<MemoryAuthStore>) -> RoleAssignments {
        RoleAssignments::from_stores(&store.stores(), Arc::new(InMemoryPermissionCache::new()))
    }

    #[tokio::test]
    async fn ensure_role_group_materializes_all_grants() {
        let store = MemoryAuthStore::new();
        let roles = assignments(&store);

        let group = roles.ensure_role_group(EmployeeRole::Cashier).await.unwrap();
        assert_eq!(group.name, "Cashier");

        let directory = GroupDirectory::from_stores(&store.stores());
        let attached = directory.permissions_for_group(group.id).await.unwrap();
        assert_eq!(attached.len(), CASHIER_GRANTS.len());

        // Re-ensuring attaches nothing new.
        roles.ensure_role_group(EmployeeRole::Cashier).await.unwrap();
        let attached_again = directory.permissions_for_group(group.id).await.unwrap();
        assert_eq!(attached_again.len(), CASHIER_GRANTS.len());
    }

    #[tokio::test]
    async fn assigning_twice_produces_one_membership_row() {
        let store = MemoryAuthStore::new();
        let roles = assignments(&store);
        let user = seeded_user(&store).await;

        roles.assign_user(EmployeeRole::Manager, &user).await.unwrap();
        roles.assign_user(EmployeeRole::Manager, &user).await.unwrap();

        let rows = store.list_for_user(user.id).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn unassign_tolerates_non_member() {
        let store = MemoryAuthStore::new();
        let roles = assignments(&store);
        let user = seeded_user(&store).await;

        roles.unassign_user(EmployeeRole::Cashier, &user).await.unwrap();
    }
}
