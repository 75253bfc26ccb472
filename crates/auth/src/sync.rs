//! Employee-role synchronizer: keeps group membership in step with the
//! linked employee's role.

use std::sync::Arc;

use storekeep_core::{EmployeeId, EmployeeRole};

use crate::cache::PermissionCache;
use crate::error::AuthError;
use crate::role::RoleAssignments;
use crate::store::{AuthStores, UserFilter, UserStore};
use crate::user::User;

/// Re-evaluates a user's role-group membership on employee lifecycle events.
///
/// Every transition strips the user from **both** role groups before adding
/// one, so the at-most-one-role invariant holds even if a prior partial
/// failure left stale membership behind. Callers are expected to run each
/// operation against the stores of one transaction
/// (see [`crate::store::AuthUnitOfWork`]); nothing here compensates on
/// partial failure.
#[derive(Clone)]
pub struct EmployeeRoleSync {
    roles: RoleAssignments,
    users: Arc<dyn UserStore>,
}

impl EmployeeRoleSync {
    pub fn new(roles: RoleAssignments, users: Arc<dyn UserStore>) -> Self {
        Self { roles, users }
    }

    pub fn from_stores(stores: &AuthStores, cache: Arc<dyn PermissionCache>) -> Self {
        Self::new(RoleAssignments::from_stores(stores, cache), stores.users.clone())
    }

    /// Link `employee` to `user` and put the user in the matching role group.
    ///
    /// Returns the updated user (employee link set).
    pub async fn assign(
        &self,
        user: &User,
        employee_id: EmployeeId,
        role: EmployeeRole,
    ) -> Result<User, AuthError> {
        self.strip_role_groups(user).await?;

        let user = self.users.set_employee(user.id, Some(employee_id)).await?;
        self.roles.assign_user(role, &user).await?;

        tracing::info!(user = %user.username, role = %role, "linked employee to user");
        Ok(user)
    }

    /// Clear the employee link and all role-group membership.
    pub async fn remove(&self, user: &User) -> Result<User, AuthError> {
        self.strip_role_groups(user).await?;

        let user = self.users.set_employee(user.id, None).await?;
        tracing::info!(user = %user.username, "unlinked employee from user");
        Ok(user)
    }

    /// Re-run role assignment for every user linked to `employee_id`
    /// (normally zero or one, but multiple links are tolerated). The
    /// employee link itself is left untouched.
    pub async fn sync_role_change(
        &self,
        employee_id: &EmployeeId,
        role: EmployeeRole,
    ) -> Result<(), AuthError> {
        let linked = self.users.search(&UserFilter::by_employee(employee_id)).await?;

        for user in linked {
            self.strip_role_groups(&user).await?;
            self.roles.assign_user(role, &user).await?;
        }

        Ok(())
    }

    async fn strip_role_groups(&self, user: &User) -> Result<(), AuthError> {
        self.roles.unassign_user(EmployeeRole::Cashier, user).await?;
        self.roles.unassign_user(EmployeeRole::Manager, user).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryPermissionCache;
    use crate::group::GroupDirectory;
    use crate::store::MemoryAuthStore;
    use crate::user::NewUser;

    struct Fixture {
        store: Arc<MemoryAuthStore>,
        sync: EmployeeRoleSync,
        directory: GroupDirectory,
        user: User,
    }

    async fn fixture() -> Fixture {
        let store = MemoryAuthStore::new();
        let stores = store.stores();
        let cache: Arc<dyn PermissionCache> = Arc::new(InMemoryPermissionCache::new());
        let sync = EmployeeRoleSync::from_stores(&stores, cache);
        let directory = GroupDirectory::from_stores(&stores);
        let user = UserStore::create(
            &*stores.users,
            NewUser {
                username: "petro".to_string(),
                password_hash: "x".to_string(),
                is_superuser: false,
            },
        )
        .await
        .unwrap();

        Fixture {
            store,
            sync,
            directory,
            user,
        }
    }

    fn employee(id: &str) -> EmployeeId {
        EmployeeId::new(id).unwrap()
    }

    async fn member_of(f: &Fixture, user: &User, group_name: &str) -> bool {
        let groups = f.directory.groups_for_user(user.id).await.unwrap();
        groups.iter().any(|g| g.name == group_name)
    }

    #[tokio::test]
    async fn assign_links_employee_and_joins_role_group() {
        let f = fixture().await;

        let updated = f
            .sync
            .assign(&f.user, employee("0000000001"), EmployeeRole::Cashier)
            .await
            .unwrap();

        assert_eq!(updated.employee_id, Some(employee("0000000001")));
        assert!(member_of(&f, &updated, "Cashier").await);
        assert!(!member_of(&f, &updated, "Manager").await);
    }

    #[tokio::test]
    async fn reassignment_holds_single_role_invariant() {
        let f = fixture().await;

        let updated = f
            .sync
            .assign(&f.user, employee("0000000001"), EmployeeRole::Cashier)
            .await
            .unwrap();
        let updated = f
            .sync
            .assign(&updated, employee("0000000002"), EmployeeRole::Manager)
            .await
            .unwrap();

        assert_eq!(updated.employee_id, Some(employee("0000000002")));
        assert!(member_of(&f, &updated, "Manager").await);
        assert!(!member_of(&f, &updated, "Cashier").await);
    }

    #[tokio::test]
    async fn remove_clears_link_and_membership() {
        let f = fixture().await;

        let updated = f
            .sync
            .assign(&f.user, employee("0000000001"), EmployeeRole::Manager)
            .await
            .unwrap();
        let updated = f.sync.remove(&updated).await.unwrap();

        assert_eq!(updated.employee_id, None);
        assert!(!member_of(&f, &updated, "Manager").await);
        assert!(!member_of(&f, &updated, "Cashier").await);
    }

    #[tokio::test]
    async fn role_change_moves_linked_users_between_groups() {
        let f = fixture().await;
        let id = employee("0000000001");

        let updated = f
            .sync
            .assign(&f.user, id.clone(), EmployeeRole::Cashier)
            .await
            .unwrap();

        f.sync
            .sync_role_change(&id, EmployeeRole::Manager)
            .await
            .unwrap();

        let refetched = f.store.get(updated.id).await.unwrap();
        // The link is untouched; only membership moved.
        assert_eq!(refetched.employee_id, Some(id));
        assert!(member_of(&f, &refetched, "Manager").await);
        assert!(!member_of(&f, &refetched, "Cashier").await);
    }

    #[tokio::test]
    async fn role_change_with_no_linked_users_is_a_noop() {
        let f = fixture().await;

        f.sync
            .sync_role_change(&employee("0000000009"), EmployeeRole::Cashier)
            .await
            .unwrap();

        assert!(!member_of(&f, &f.user, "Cashier").await);
    }
}
