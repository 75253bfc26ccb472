//! Permission catalog: derives and persists canonical permission sets.

use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::PermissionCache;
use crate::error::AuthError;
use crate::permission::{Action, BasicAction, PermissionRecord, ResourceType};
use crate::store::{AuthStores, PermissionFilter, PermissionStore, StoreError};

/// Catalog of durable permissions, keyed by (resource type, codename).
///
/// Creation is idempotent twice over: an injected read-through cache keyed by
/// resource-type name, and catch-and-treat-as-success on the storage layer's
/// uniqueness constraint when two callers race on first use.
#[derive(Clone)]
pub struct PermissionCatalog {
    permissions: Arc<dyn PermissionStore>,
    cache: Arc<dyn PermissionCache>,
}

impl PermissionCatalog {
    pub fn new(permissions: Arc<dyn PermissionStore>, cache: Arc<dyn PermissionCache>) -> Self {
        Self { permissions, cache }
    }

    pub fn from_stores(stores: &AuthStores, cache: Arc<dyn PermissionCache>) -> Self {
        Self::new(stores.permissions.clone(), cache)
    }

    /// Ensure the four basic permissions exist for `resource`.
    ///
    /// Returns the resource type's full permission set (basic plus any ad-hoc
    /// permissions already persisted) and whether anything was newly created.
    pub async fn ensure_basic_permissions(
        &self,
        resource: &ResourceType,
    ) -> Result<(Vec<PermissionRecord>, bool), AuthError> {
        if let Some(cached) = self.cache.get(resource.as_str()) {
            return Ok((cached, false));
        }

        let mut set = self
            .permissions
            .search(&PermissionFilter::by_resource(resource.as_str()))
            .await?;
        let existing: HashSet<&str> = set.iter().map(|p| p.codename.as_str()).collect();

        let missing: Vec<String> = BasicAction::ALL
            .iter()
            .map(|action| resource.codename(&Action::Basic(*action)))
            .filter(|codename| !existing.contains(codename.as_str()))
            .collect();

        let mut created_any = false;
        for codename in missing {
            match self.permissions.create(resource.as_str(), &codename).await {
                Ok(record) => {
                    tracing::debug!(resource = %resource, codename = %record.codename, "created permission");
                    set.push(record);
                    created_any = true;
                }
                Err(StoreError::AlreadyExists) => {
                    // Lost a race with a concurrent first use; adopt the winner's row.
                    let winner = self
                        .find_exact(resource.as_str(), &codename)
                        .await?
                        .ok_or_else(|| {
                            AuthError::NotFound(format!(
                                "permission {codename} reported as existing but not found"
                            ))
                        })?;
                    set.push(winner);
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.cache.put(resource.as_str(), &set);
        Ok((set, created_any))
    }

    /// Look up a permission by exact (resource type, action) pair, creating it
    /// if absent. Used for ad-hoc permissions such as `view_self`.
    pub async fn get_or_create(
        &self,
        resource: &ResourceType,
        action: &Action,
    ) -> Result<PermissionRecord, AuthError> {
        let codename = resource.codename(action);

        if let Some(found) = self.find_exact(resource.as_str(), &codename).await? {
            return Ok(found);
        }

        match self.permissions.create(resource.as_str(), &codename).await {
            Ok(record) => Ok(record),
            Err(StoreError::AlreadyExists) => self
                .find_exact(resource.as_str(), &codename)
                .await?
                .ok_or_else(|| {
                    AuthError::NotFound(format!(
                        "permission {codename} reported as existing but not found"
                    ))
                }),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_exact(
        &self,
        resource_type: &str,
        codename: &str,
    ) -> Result<Option<PermissionRecord>, AuthError> {
        let found = self
            .permissions
            .search(&PermissionFilter::exact(resource_type, codename))
            .await?;
        Ok(found.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryPermissionCache;
    use crate::store::MemoryAuthStore;

    fn catalog(store: &Arc<MemoryAuthStore>) -> PermissionCatalog {
        PermissionCatalog::from_stores(&store.stores(), Arc::new(InMemoryPermissionCache::new()))
    }

    #[tokio::test]
    async fn ensure_basic_permissions_is_idempotent() {
        let store = MemoryAuthStore::new();
        let catalog = catalog(&store);
        let product = ResourceType::PRODUCT;

        let (first, created) = catalog.ensure_basic_permissions(&product).await.unwrap();
        assert!(created);
        assert_eq!(first.len(), 4);

        let (second, created_again) = catalog.ensure_basic_permissions(&product).await.unwrap();
        assert!(!created_again);

        let mut first_names: Vec<_> = first.iter().map(|p| p.codename.clone()).collect();
        let mut second_names: Vec<_> = second.iter().map(|p| p.codename.clone()).collect();
        first_names.sort();
        second_names.sort();
        assert_eq!(first_names, second_names);
        assert!(first_names.contains(&"product.can_view".to_string()));
    }

    #[tokio::test]
    async fn ensure_does_not_reinsert_without_cache() {
        // Second line of defense: even with a cold cache, existing rows are
        // found in storage and not recreated.
        let store = MemoryAuthStore::new();
        let cold = PermissionCatalog::from_stores(&store.stores(), Arc::new(crate::cache::NoopPermissionCache));

        let (_, created) = cold
            .ensure_basic_permissions(&ResourceType::CATEGORY)
            .await
            .unwrap();
        assert!(created);

        let (set, created_again) = cold
            .ensure_basic_permissions(&ResourceType::CATEGORY)
            .await
            .unwrap();
        assert!(!created_again);
        assert_eq!(set.len(), 4);
    }

    #[tokio::test]
    async fn get_or_create_returns_existing_ad_hoc_permission() {
        let store = MemoryAuthStore::new();
        let catalog = catalog(&store);
        let action = Action::named("view_self");

        let first = catalog
            .get_or_create(&ResourceType::EMPLOYEE, &action)
            .await
            .unwrap();
        assert_eq!(first.codename, "employee.view_self");

        let second = catalog
            .get_or_create(&ResourceType::EMPLOYEE, &action)
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
