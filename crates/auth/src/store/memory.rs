//! In-memory auth storage for tests/dev. Not optimized for performance.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use storekeep_core::{EmployeeId, GroupId, PermissionId, UserId};

use crate::permission::PermissionRecord;
use crate::user::{NewUser, User};

use super::{
    AuthStores, AuthTransaction, AuthUnitOfWork, GroupGrant, GroupPermissionStore, GroupRecord,
    GroupStore, Membership, MembershipStore, PermissionFilter, PermissionStore, StoreError,
    StoreResult, UserFilter, UserStore,
};

#[derive(Debug, Default)]
struct State {
    permissions: Vec<PermissionRecord>,
    groups: Vec<GroupRecord>,
    memberships: Vec<Membership>,
    group_grants: Vec<GroupGrant>,
    users: Vec<User>,
    next_permission_id: i64,
    next_group_id: i64,
    next_user_id: i64,
}

/// Single-process auth store backing all five collaborator traits.
///
/// Enforces the same uniqueness constraints the relational schema does, so
/// the catalog's conflict-handling paths are exercised in tests.
#[derive(Debug, Default)]
pub struct MemoryAuthStore {
    inner: RwLock<State>,
}

impl MemoryAuthStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bundle of store handles all backed by this instance.
    pub fn stores(self: &Arc<Self>) -> AuthStores {
        AuthStores {
            permissions: self.clone(),
            groups: self.clone(),
            memberships: self.clone(),
            group_permissions: self.clone(),
            users: self.clone(),
        }
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl PermissionStore for MemoryAuthStore {
    async fn search(&self, filter: &PermissionFilter) -> StoreResult<Vec<PermissionRecord>> {
        let state = self.read()?;
        Ok(state
            .permissions
            .iter()
            .filter(|p| {
                filter
                    .resource_type
                    .as_deref()
                    .is_none_or(|rt| p.resource_type == rt)
                    && filter.codename.as_deref().is_none_or(|cn| p.codename == cn)
            })
            .cloned()
            .collect())
    }

    async fn create(&self, resource_type: &str, codename: &str) -> StoreResult<PermissionRecord> {
        let mut state = self.write()?;
        if state
            .permissions
            .iter()
            .any(|p| p.resource_type == resource_type && p.codename == codename)
        {
            return Err(StoreError::AlreadyExists);
        }
        state.next_permission_id += 1;
        let record = PermissionRecord {
            id: PermissionId::new(state.next_permission_id),
            resource_type: resource_type.to_string(),
            codename: codename.to_string(),
        };
        state.permissions.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: PermissionId) -> StoreResult<PermissionRecord> {
        let state = self.read()?;
        state
            .permissions
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_all(&self) -> StoreResult<Vec<PermissionRecord>> {
        Ok(self.read()?.permissions.clone())
    }
}

#[async_trait]
impl GroupStore for MemoryAuthStore {
    async fn get_by_name(&self, name: &str) -> StoreResult<Option<GroupRecord>> {
        Ok(self.read()?.groups.iter().find(|g| g.name == name).cloned())
    }

    async fn create(&self, name: &str) -> StoreResult<GroupRecord> {
        let mut state = self.write()?;
        if state.groups.iter().any(|g| g.name == name) {
            return Err(StoreError::AlreadyExists);
        }
        state.next_group_id += 1;
        let record = GroupRecord {
            id: GroupId::new(state.next_group_id),
            name: name.to_string(),
        };
        state.groups.push(record.clone());
        Ok(record)
    }

    async fn list_by_ids(&self, ids: &[GroupId]) -> StoreResult<Vec<GroupRecord>> {
        let state = self.read()?;
        Ok(state
            .groups
            .iter()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MembershipStore for MemoryAuthStore {
    async fn add(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state
            .memberships
            .iter()
            .any(|m| m.user_id == user_id && m.group_id == group_id)
        {
            return Err(StoreError::AlreadyExists);
        }
        state.memberships.push(Membership { user_id, group_id });
        Ok(())
    }

    async fn remove(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .memberships
            .retain(|m| !(m.user_id == user_id && m.group_id == group_id));
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Membership>> {
        let state = self.read()?;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .copied()
            .collect())
    }

    async fn list_for_group(&self, group_id: GroupId) -> StoreResult<Vec<Membership>> {
        let state = self.read()?;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.group_id == group_id)
            .copied()
            .collect())
    }
}

#[async_trait]
impl GroupPermissionStore for MemoryAuthStore {
    async fn add(&self, group_id: GroupId, permission_id: PermissionId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state
            .group_grants
            .iter()
            .any(|g| g.group_id == group_id && g.permission_id == permission_id)
        {
            return Err(StoreError::AlreadyExists);
        }
        state.group_grants.push(GroupGrant {
            group_id,
            permission_id,
        });
        Ok(())
    }

    async fn remove(&self, group_id: GroupId, permission_id: PermissionId) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .group_grants
            .retain(|g| !(g.group_id == group_id && g.permission_id == permission_id));
        Ok(())
    }

    async fn list_for_group(&self, group_id: GroupId) -> StoreResult<Vec<GroupGrant>> {
        let state = self.read()?;
        Ok(state
            .group_grants
            .iter()
            .filter(|g| g.group_id == group_id)
            .copied()
            .collect())
    }

    async fn list_for_permission(&self, permission_id: PermissionId) -> StoreResult<Vec<GroupGrant>> {
        let state = self.read()?;
        Ok(state
            .group_grants
            .iter()
            .filter(|g| g.permission_id == permission_id)
            .copied()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryAuthStore {
    async fn get(&self, id: UserId) -> StoreResult<User> {
        let state = self.read()?;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.write()?;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::AlreadyExists);
        }
        state.next_user_id += 1;
        let record = User {
            id: UserId::new(state.next_user_id),
            username: user.username,
            password_hash: user.password_hash,
            is_superuser: user.is_superuser,
            employee_id: None,
        };
        state.users.push(record.clone());
        Ok(record)
    }

    async fn set_employee(&self, id: UserId, employee_id: Option<EmployeeId>) -> StoreResult<User> {
        let mut state = self.write()?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.employee_id = employee_id;
        Ok(user.clone())
    }

    async fn search(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .filter(|u| {
                filter
                    .username
                    .as_deref()
                    .is_none_or(|name| u.username == name)
                    && filter
                        .employee_id
                        .as_ref()
                        .is_none_or(|id| u.employee_id.as_ref() == Some(id))
            })
            .cloned()
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work (test double: commits are no-ops, there is no rollback)
// ─────────────────────────────────────────────────────────────────────────────

/// "Transaction" over the in-memory store.
///
/// Mutations apply immediately and are not rolled back on drop; this double
/// only preserves the calling convention of the Postgres unit of work.
pub struct MemoryTransaction {
    stores: AuthStores,
}

#[async_trait]
impl AuthTransaction for MemoryTransaction {
    fn stores(&self) -> AuthStores {
        self.stores.clone()
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

/// Unit of work over a shared in-memory store.
pub struct MemoryUnitOfWork {
    store: Arc<MemoryAuthStore>,
}

impl MemoryUnitOfWork {
    pub fn new(store: Arc<MemoryAuthStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthUnitOfWork for MemoryUnitOfWork {
    async fn begin(&self) -> StoreResult<Box<dyn AuthTransaction>> {
        Ok(Box::new(MemoryTransaction {
            stores: self.store.stores(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_permission_create_is_distinguishable() {
        let store = MemoryAuthStore::new();
        PermissionStore::create(&*store, "Product", "product.can_view")
            .await
            .unwrap();
        let err = PermissionStore::create(&*store, "Product", "product.can_view")
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists);
    }

    #[tokio::test]
    async fn membership_remove_of_non_member_is_noop() {
        let store = MemoryAuthStore::new();
        MembershipStore::remove(&*store, UserId::new(1), GroupId::new(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn user_search_filters_by_employee_link() {
        let store = MemoryAuthStore::new();
        let user = UserStore::create(
            &*store,
            NewUser {
                username: "kasia".to_string(),
                password_hash: "x".to_string(),
                is_superuser: false,
            },
        )
        .await
        .unwrap();

        let employee_id = EmployeeId::new("0000000001").unwrap();
        store
            .set_employee(user.id, Some(employee_id.clone()))
            .await
            .unwrap();

        let found = UserStore::search(&*store, &UserFilter::by_employee(&employee_id))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, user.id);
    }
}
